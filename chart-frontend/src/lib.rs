//! Benchmark landing-page charts: the timeline of model releases, the task bar
//! chart and the size scatter. Rendering goes through [`surface::DrawingSurface`],
//! implemented by the DOM on `wasm32` and by the in-memory [`scene::Scene`]
//! everywhere.

use dataset_source::SourceError;
use thiserror::Error;

pub mod axis;
pub mod bar_chart;
pub mod config;
pub mod curve;
pub mod layout;
pub mod markers;
pub mod render;
pub mod resize;
pub mod scale;
pub mod scatter;
pub mod scene;
pub mod surface;
pub mod timeline;
pub mod tooltip;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use config::ChartConfig;
pub use render::{RenderOutcome, Renderer};
pub use scene::Scene;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("invalid chart configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Scene(#[from] scene::SceneError),
    #[error("dom error: {0}")]
    Dom(String),
}

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dataset_source::HttpSource;
    use js_sys::Promise;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::{future_to_promise, spawn_local};

    use crate::dom::{
        on_page_load, scroll_panel_to_latest, viewport_width, window, DomLogoLoader, DomSurface,
        GsapAnimation, TimeoutScheduler,
    };
    use crate::resize::Debouncer;
    use crate::surface::AnimationPort;
    use crate::{ChartConfig, ChartError, Renderer};

    type WebRenderer = Renderer<HttpSource, DomLogoLoader>;

    struct SiteInner {
        renderer: WebRenderer,
        resize: RefCell<Option<Rc<Debouncer<TimeoutScheduler>>>>,
    }

    fn to_js(err: ChartError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }

    fn report(chart: &str, err: &ChartError) {
        web_sys::console::error_1(&JsValue::from_str(&format!("{chart} chart failed: {err}")));
    }

    async fn timeline_into(
        site: Rc<SiteInner>,
        container_id: String,
        tooltip_id: String,
    ) -> Result<(), ChartError> {
        let Some(mut surface) = DomSurface::attach(&container_id, Some(&tooltip_id))? else {
            return Ok(());
        };
        let gsap = GsapAnimation::detect();
        let animation = gsap.as_ref().map(|g| g as &dyn AnimationPort<DomSurface>);
        site.renderer
            .timeline(&container_id, &mut surface, animation)
            .await?;
        Ok(())
    }

    async fn bar_chart_into(site: Rc<SiteInner>, container_id: String) -> Result<(), ChartError> {
        let Some(mut surface) = DomSurface::attach(&container_id, None)? else {
            return Ok(());
        };
        site.renderer.bar_chart(&container_id, &mut surface).await?;
        Ok(())
    }

    async fn scatter_into(site: Rc<SiteInner>, container_id: String) -> Result<(), ChartError> {
        let Some(mut surface) = DomSurface::attach(&container_id, None)? else {
            return Ok(());
        };
        site.renderer.scatter(&container_id, &mut surface).await?;
        Ok(())
    }

    /// The charts of one page, sharing a configuration and a dataset cache.
    #[wasm_bindgen]
    pub struct ChartSite {
        inner: Rc<SiteInner>,
    }

    impl ChartSite {
        fn from_config(config: ChartConfig) -> Self {
            Self {
                inner: Rc::new(SiteInner {
                    renderer: Renderer::new(config, HttpSource, DomLogoLoader),
                    resize: RefCell::new(None),
                }),
            }
        }

        fn config(&self) -> &ChartConfig {
            self.inner.renderer.config()
        }
    }

    impl Default for ChartSite {
        fn default() -> Self {
            Self::from_config(ChartConfig::from_global())
        }
    }

    #[wasm_bindgen]
    impl ChartSite {
        /// Site configured from the page global, or the defaults.
        #[wasm_bindgen(constructor)]
        pub fn new() -> ChartSite {
            Self::default()
        }

        /// Site configured from a JSON document; missing fields keep their defaults.
        #[wasm_bindgen(js_name = withConfig)]
        pub fn with_config(json: &str) -> Result<ChartSite, JsValue> {
            ChartConfig::from_json(json)
                .map(Self::from_config)
                .map_err(to_js)
        }

        pub fn render_timeline(&self, container_id: String, tooltip_id: String) -> Promise {
            let site = self.inner.clone();
            future_to_promise(async move {
                timeline_into(site, container_id, tooltip_id)
                    .await
                    .map(|_| JsValue::UNDEFINED)
                    .map_err(to_js)
            })
        }

        pub fn render_task_bar_chart(&self, container_id: String) -> Promise {
            let site = self.inner.clone();
            future_to_promise(async move {
                bar_chart_into(site, container_id)
                    .await
                    .map(|_| JsValue::UNDEFINED)
                    .map_err(to_js)
            })
        }

        pub fn render_size_scatter(&self, container_id: String) -> Promise {
            let site = self.inner.clone();
            future_to_promise(async move {
                scatter_into(site, container_id)
                    .await
                    .map(|_| JsValue::UNDEFINED)
                    .map_err(to_js)
            })
        }

        /// Start all three charts independently; a failing chart is logged to the
        /// console and does not stop the others.
        pub fn render_all(&self) {
            render_all_charts(&self.inner);
        }

        /// Re-render every chart once resizing has been quiet for the configured
        /// period. Installing twice keeps the first handler.
        pub fn install_resize_handler(&self) -> Result<(), JsValue> {
            if self.inner.resize.borrow().is_some() {
                return Ok(());
            }
            let debouncer = Rc::new(Debouncer::new(
                TimeoutScheduler,
                self.config().resize_debounce_ms,
            ));
            let site = self.inner.clone();
            let pending = debouncer.clone();
            let resize_cb = Closure::<dyn FnMut()>::wrap(Box::new(move || {
                let site = site.clone();
                pending.trigger(move || render_all_charts(&site));
            }));
            window()
                .map_err(to_js)?
                .add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref())?;
            resize_cb.forget();
            *self.inner.resize.borrow_mut() = Some(debouncer);
            Ok(())
        }

        /// Page bootstrap: render everything, follow resizes, and on narrow
        /// viewports scroll the timeline panel to the newest models once loaded.
        pub fn start(&self) -> Result<(), JsValue> {
            console_error_panic_hook::set_once();
            self.render_all();
            self.install_resize_handler()?;
            if viewport_width() <= self.config().narrow_viewport_px {
                let selector = self.config().timeline_panel_selector.clone();
                on_page_load(move || {
                    if let Err(e) = scroll_panel_to_latest(&selector) {
                        report("timeline", &e);
                    }
                })
                .map_err(to_js)?;
            }
            Ok(())
        }
    }

    fn render_all_charts(site: &Rc<SiteInner>) {
        let config = site.renderer.config();
        let timeline = config.timeline.clone();
        let bar_id = config.bar_chart.container_id.clone();
        let scatter_id = config.scatter.container_id.clone();

        let s = site.clone();
        spawn_local(async move {
            if let Err(e) = timeline_into(s, timeline.container_id, timeline.tooltip_id).await {
                report("timeline", &e);
            }
        });
        let s = site.clone();
        spawn_local(async move {
            if let Err(e) = bar_chart_into(s, bar_id).await {
                report("task bar", &e);
            }
        });
        let s = site.clone();
        spawn_local(async move {
            if let Err(e) = scatter_into(s, scatter_id).await {
                report("size scatter", &e);
            }
        });
    }

    thread_local! {
        static DEFAULT_SITE: ChartSite = ChartSite::default();
    }

    fn with_default<R>(f: impl FnOnce(&ChartSite) -> R) -> R {
        DEFAULT_SITE.with(f)
    }

    #[wasm_bindgen]
    pub fn render_timeline(container_id: String, tooltip_id: String) -> Promise {
        with_default(|site| site.render_timeline(container_id, tooltip_id))
    }

    #[wasm_bindgen]
    pub fn render_task_bar_chart(container_id: String) -> Promise {
        with_default(|site| site.render_task_bar_chart(container_id))
    }

    #[wasm_bindgen]
    pub fn render_size_scatter(container_id: String) -> Promise {
        with_default(|site| site.render_size_scatter(container_id))
    }

    #[wasm_bindgen]
    pub fn render_all() {
        with_default(ChartSite::render_all);
    }

    #[wasm_bindgen]
    pub fn install_resize_handler() -> Result<(), JsValue> {
        with_default(ChartSite::install_resize_handler)
    }

    #[wasm_bindgen]
    pub fn start() -> Result<(), JsValue> {
        with_default(ChartSite::start)
    }
}
