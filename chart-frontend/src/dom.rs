//! Browser backends: SVG in a DOM container, image preloading, the GSAP
//! animation adapter and `setTimeout` scheduling.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use js_sys::{Function, Object, Promise, Reflect};
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, DomRect, Element, HtmlElement, HtmlImageElement, MouseEvent, SvgGraphicsElement,
    Window,
};

use crate::resize::Scheduler;
use crate::surface::{
    AnimationPort, BBox, DrawingSurface, Element as Shape, FadeIn, LogoFuture, LogoLoader,
    Viewport, SVG_NS,
};
use crate::tooltip::{
    tooltip_position, HoverEffect, MarkerInteraction, PointerEvent, TooltipBounds,
    HOVER_TRANSITION_MS,
};
use crate::ChartError;

type Listener = Closure<dyn FnMut(MouseEvent)>;

thread_local! {
    // Marker listeners live as long as the elements of the container's current render.
    static LISTENERS: RefCell<HashMap<String, Vec<Listener>>> = RefCell::new(HashMap::new());
}

pub(crate) fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn window() -> Result<Window, ChartError> {
    web_sys::window().ok_or_else(|| ChartError::Dom("no window".to_string()))
}

fn document() -> Result<Document, ChartError> {
    window()?
        .document()
        .ok_or_else(|| ChartError::Dom("no document".to_string()))
}

pub(crate) fn read_global(key: &str) -> Option<String> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

/// Draws into the element with `container_id`, replacing its children.
pub struct DomSurface {
    window: Window,
    document: Document,
    container_id: String,
    container: Element,
    tooltip: Option<HtmlElement>,
}

impl DomSurface {
    /// `Ok(None)` when the page has no such container.
    pub fn attach(container_id: &str, tooltip_id: Option<&str>) -> Result<Option<Self>, ChartError> {
        let window = window()?;
        let document = document()?;
        let Some(container) = document.get_element_by_id(container_id) else {
            return Ok(None);
        };
        let tooltip = tooltip_id
            .and_then(|id| document.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        Ok(Some(Self {
            window,
            document,
            container_id: container_id.to_string(),
            container,
            tooltip,
        }))
    }

    fn create(&self, shape: Shape) -> Result<Element, ChartError> {
        self.document
            .create_element_ns(Some(SVG_NS), shape.tag())
            .map_err(|e| ChartError::Dom(js_message(&e)))
    }

    fn adopt(&self, parent: &Element, child: Element) -> Result<Element, ChartError> {
        parent
            .append_child(&child)
            .map_err(|e| ChartError::Dom(js_message(&e)))?;
        Ok(child)
    }
}

impl DrawingSurface for DomSurface {
    type Node = Element;
    type Error = ChartError;

    fn viewport(&self) -> Viewport {
        let window_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Viewport {
            container_width: f64::from(self.container.client_width()),
            container_top: self.container.get_bounding_client_rect().top(),
            window_height,
        }
    }

    fn clear(&mut self) {
        self.container.set_inner_html("");
        if let Some(tooltip) = &self.tooltip {
            let _ = tooltip.class_list().remove_1("visible");
        }
        LISTENERS.with(|l| {
            l.borrow_mut().remove(&self.container_id);
        });
    }

    fn append_root(&mut self, width: f64, height: f64) -> Result<Element, ChartError> {
        let svg = self.create(Shape::Svg)?;
        crate::attrs!(self, &svg, "width" => width, "height" => height);
        self.adopt(&self.container, svg)
    }

    fn append(&mut self, parent: &Element, element: Shape) -> Result<Element, ChartError> {
        let child = self.create(element)?;
        self.adopt(parent, child)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            warn!(name, error = %js_message(&e), "set_attribute failed");
        }
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn text_bbox(&self, node: &Element) -> BBox {
        node.dyn_ref::<SvgGraphicsElement>()
            .and_then(|g| g.get_b_box().ok())
            .map(|r| BBox {
                x: f64::from(r.x()),
                y: f64::from(r.y()),
                width: f64::from(r.width()),
                height: f64::from(r.height()),
            })
            .unwrap_or_default()
    }

    fn bind_marker(&mut self, node: &Element, interaction: MarkerInteraction) {
        let target = Rc::new(HoverTarget {
            node: node.clone(),
            wrapper: self
                .container
                .parent_element()
                .unwrap_or_else(|| self.container.clone()),
            tooltip: self.tooltip.clone(),
            state: RefCell::new(interaction),
            animation: GsapAnimation::detect(),
        });

        let events: [(&str, fn(f64, f64) -> PointerEvent); 3] = [
            ("mouseenter", |x, y| PointerEvent::Enter { x, y }),
            ("mousemove", |x, y| PointerEvent::Move { x, y }),
            ("mouseleave", |_, _| PointerEvent::Leave),
        ];
        for (name, to_event) in events {
            let target = target.clone();
            let closure = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
                target.on_pointer(&event, to_event);
            }));
            if let Err(e) = node.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                warn!(event = name, error = %js_message(&e), "could not bind marker listener");
                continue;
            }
            LISTENERS.with(|l| {
                l.borrow_mut()
                    .entry(self.container_id.clone())
                    .or_default()
                    .push(closure);
            });
        }
    }
}

/// One marker's DOM side of the hover state machine.
struct HoverTarget {
    node: Element,
    wrapper: Element,
    tooltip: Option<HtmlElement>,
    state: RefCell<MarkerInteraction>,
    animation: Option<GsapAnimation>,
}

impl HoverTarget {
    fn on_pointer(&self, event: &MouseEvent, to_event: fn(f64, f64) -> PointerEvent) {
        let rect = self.wrapper.get_bounding_client_rect();
        let x = f64::from(event.client_x()) - rect.left();
        let y = f64::from(event.client_y()) - rect.top();
        let effects = self.state.borrow_mut().handle(to_event(x, y));
        for effect in effects {
            self.apply(effect, &rect);
        }
    }

    /// Bounds for placing the panel, measured with its current content.
    fn tooltip_bounds(&self, wrapper: &DomRect) -> TooltipBounds {
        TooltipBounds {
            width: wrapper.width(),
            height: wrapper.height(),
            tooltip_height: self
                .tooltip
                .as_ref()
                .map(|t| f64::from(t.offset_height()))
                .filter(|h| *h > 0.0),
        }
    }

    fn apply(&self, effect: HoverEffect, wrapper: &DomRect) {
        match effect {
            HoverEffect::Transform(transform) => match &self.animation {
                Some(gsap) => gsap.tween_transform(&self.node, &transform),
                None => {
                    let _ = self.node.set_attribute("transform", &transform);
                }
            },
            HoverEffect::ShowTooltip(content) => {
                if let Some(tooltip) = &self.tooltip {
                    tooltip.set_inner_html(&content.to_html());
                    let _ = tooltip.class_list().add_1("visible");
                }
            }
            HoverEffect::MoveTooltip { x, y } => {
                if let Some(tooltip) = &self.tooltip {
                    let pos = tooltip_position(x, y, self.tooltip_bounds(wrapper));
                    let style = tooltip.style();
                    let _ = style.set_property("left", &format!("{}px", pos.left));
                    let _ = style.set_property("top", &format!("{}px", pos.top));
                }
            }
            HoverEffect::HideTooltip => {
                if let Some(tooltip) = &self.tooltip {
                    let _ = tooltip.class_list().remove_1("visible");
                }
            }
        }
    }
}

/// Page-global `gsap`, when the page loaded it.
pub struct GsapAnimation {
    gsap: JsValue,
    to: Function,
}

fn set_prop(target: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(target, &JsValue::from_str(key), &value);
}

impl GsapAnimation {
    pub fn detect() -> Option<Self> {
        let gsap = Reflect::get(&js_sys::global(), &JsValue::from_str("gsap")).ok()?;
        if gsap.is_undefined() || gsap.is_null() {
            return None;
        }
        let to = Reflect::get(&gsap, &JsValue::from_str("to"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Self { gsap, to })
    }

    fn tween(&self, target: &Element, vars: &Object) {
        if let Err(e) = self.to.call2(&self.gsap, target, vars) {
            warn!(error = %js_message(&e), "gsap.to failed");
        }
    }

    fn tween_transform(&self, node: &Element, transform: &str) {
        let attr = Object::new();
        set_prop(&attr, "transform", JsValue::from_str(transform));
        let vars = Object::new();
        set_prop(&vars, "attr", attr.into());
        set_prop(
            &vars,
            "duration",
            JsValue::from_f64(f64::from(HOVER_TRANSITION_MS) / 1000.0),
        );
        self.tween(node, &vars);
    }
}

impl AnimationPort<DomSurface> for GsapAnimation {
    fn fade_in(&self, _surface: &mut DomSurface, node: &Element, fade: FadeIn) {
        let vars = Object::new();
        set_prop(&vars, "opacity", JsValue::from_f64(fade.opacity));
        set_prop(&vars, "duration", JsValue::from_f64(fade.duration_secs));
        set_prop(&vars, "delay", JsValue::from_f64(fade.delay_secs));
        set_prop(&vars, "ease", JsValue::from_str("power2.out"));
        self.tween(node, &vars);
    }
}

/// Loads logos through `HtmlImageElement`, so the browser cache serves the
/// `<image>` elements drawn afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomLogoLoader;

impl LogoLoader for DomLogoLoader {
    fn load(&self, url: &str) -> LogoFuture {
        let url = url.to_string();
        Box::pin(async move {
            let Ok(img) = HtmlImageElement::new() else {
                return false;
            };
            let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
                let on_load = {
                    let resolve = resolve.clone();
                    Closure::once_into_js(move || {
                        let _ = resolve.call1(&JsValue::NULL, &JsValue::TRUE);
                    })
                };
                let on_error = Closure::once_into_js(move || {
                    let _ = resolve.call1(&JsValue::NULL, &JsValue::FALSE);
                });
                img.set_onload(Some(on_load.unchecked_ref()));
                img.set_onerror(Some(on_error.unchecked_ref()));
                img.set_src(&url);
            });
            JsFuture::from(promise)
                .await
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        })
    }
}

/// `setTimeout`-backed scheduler. Dropping a handle also cancels it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    type Handle = Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(delay_ms, task)
    }

    fn cancel(&self, handle: Timeout) {
        handle.cancel();
    }
}

pub fn viewport_width() -> f64 {
    window()
        .ok()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Scroll a horizontally scrolling panel to its right end, where the newest
/// models are.
pub fn scroll_panel_to_latest(selector: &str) -> Result<(), ChartError> {
    let panel = document()?
        .query_selector(selector)
        .map_err(|e| ChartError::Dom(js_message(&e)))?;
    if let Some(panel) = panel {
        panel.set_scroll_left(panel.scroll_width());
    }
    Ok(())
}

/// Run `task` once the page has fully loaded (immediately when it already has).
pub fn on_page_load(task: impl FnOnce() + 'static) -> Result<(), ChartError> {
    let window = window()?;
    if document()?.ready_state() == "complete" {
        task();
        return Ok(());
    }
    let closure = Closure::once(task);
    window
        .add_event_listener_with_callback("load", closure.as_ref().unchecked_ref())
        .map_err(|e| ChartError::Dom(js_message(&e)))?;
    closure.forget();
    Ok(())
}
