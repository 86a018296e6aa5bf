//! Debounced re-render on viewport resize.

use std::cell::RefCell;
use std::rc::Rc;

/// Deferred one-shot tasks that can be called off before they run.
pub trait Scheduler {
    type Handle;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;

    /// Cancelling a task that already ran is a no-op.
    fn cancel(&self, handle: Self::Handle);
}

/// Runs a task once triggers stop arriving for `delay_ms`. Every trigger
/// cancels the pending task and schedules a fresh one.
pub struct Debouncer<S: Scheduler> {
    scheduler: S,
    delay_ms: u32,
    pending: Rc<RefCell<Option<S::Handle>>>,
}

impl<S: Scheduler> Debouncer<S> {
    pub fn new(scheduler: S, delay_ms: u32) -> Self {
        Self {
            scheduler,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn trigger(&self, task: impl FnOnce() + 'static)
    where
        S::Handle: 'static,
    {
        let previous = self.pending.borrow_mut().take();
        if let Some(previous) = previous {
            self.scheduler.cancel(previous);
        }
        let pending = Rc::downgrade(&self.pending);
        let handle = self.scheduler.schedule(
            self.delay_ms,
            Box::new(move || {
                if let Some(pending) = pending.upgrade() {
                    pending.borrow_mut().take();
                }
                task();
            }),
        );
        *self.pending.borrow_mut() = Some(handle);
    }
}
