//! Render passes: fetch the dataset, preload logos, then draw, unless a newer
//! render of the same container started in the meantime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use dataset_source::{CachedSource, DatasetSource, SourceError};

use crate::config::ChartConfig;
use crate::surface::{preload_logos, AnimationPort, DrawingSurface, LogoLoader};
use crate::timeline::TimelineSummary;
use crate::{bar_chart, scatter, timeline, ChartError};

/// Per-container render counters. Starting a render invalidates every older
/// ticket for the same container.
#[derive(Debug, Clone, Default)]
pub struct RenderEpochs {
    counters: Rc<RefCell<HashMap<String, u64>>>,
}

impl RenderEpochs {
    pub fn begin(&self, container: &str) -> RenderTicket {
        let mut counters = self.counters.borrow_mut();
        let epoch = counters.entry(container.to_string()).or_insert(0);
        *epoch += 1;
        RenderTicket {
            container: container.to_string(),
            epoch: *epoch,
            counters: self.counters.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderTicket {
    container: String,
    epoch: u64,
    counters: Rc<RefCell<HashMap<String, u64>>>,
}

impl RenderTicket {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn is_current(&self) -> bool {
        self.counters.borrow().get(&self.container).copied() == Some(self.epoch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome<T> {
    Drawn(T),
    /// A newer render of the container began while this one was waiting.
    Superseded,
}

impl<T> RenderOutcome<T> {
    pub fn drawn(self) -> Option<T> {
        match self {
            RenderOutcome::Drawn(v) => Some(v),
            RenderOutcome::Superseded => None,
        }
    }
}

/// Shared state of the three charts on a page: configuration, dataset cache,
/// logo loader and render epochs.
pub struct Renderer<D, L> {
    config: ChartConfig,
    datasets: CachedSource<D>,
    loader: L,
    epochs: RenderEpochs,
}

impl<D, L> Renderer<D, L>
where
    D: DatasetSource<Error = SourceError>,
    L: LogoLoader,
{
    pub fn new(config: ChartConfig, source: D, loader: L) -> Self {
        Self {
            config,
            datasets: CachedSource::new(source),
            loader,
            epochs: RenderEpochs::default(),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn epochs(&self) -> &RenderEpochs {
        &self.epochs
    }

    pub fn datasets(&self) -> &CachedSource<D> {
        &self.datasets
    }

    /// Render the timeline into `surface`, keyed by `container` for staleness.
    pub async fn timeline<S>(
        &self,
        container: &str,
        surface: &mut S,
        animation: Option<&dyn AnimationPort<S>>,
    ) -> Result<RenderOutcome<TimelineSummary>, ChartError>
    where
        S: DrawingSurface,
        ChartError: From<S::Error>,
    {
        let ticket = self.epochs.begin(container);
        self.timeline_pass(ticket, surface, animation).await
    }

    pub async fn timeline_pass<S>(
        &self,
        ticket: RenderTicket,
        surface: &mut S,
        animation: Option<&dyn AnimationPort<S>>,
    ) -> Result<RenderOutcome<TimelineSummary>, ChartError>
    where
        S: DrawingSurface,
        ChartError: From<S::Error>,
    {
        let dataset = self.datasets.load(&self.config.dataset_path).await?;
        let logos = preload_logos(&self.loader, &dataset.company_logos).await;
        if !ticket.is_current() {
            debug!(container = ticket.container(), "timeline render superseded");
            return Ok(RenderOutcome::Superseded);
        }
        let summary = timeline::render(surface, &dataset, &logos, &self.config.timeline, animation)?;
        Ok(RenderOutcome::Drawn(summary))
    }

    /// Render the task bar chart. Resolves to the number of bars drawn.
    pub async fn bar_chart<S>(
        &self,
        container: &str,
        surface: &mut S,
    ) -> Result<RenderOutcome<usize>, ChartError>
    where
        S: DrawingSurface,
        ChartError: From<S::Error>,
    {
        let ticket = self.epochs.begin(container);
        let dataset = self.datasets.load(&self.config.dataset_path).await?;
        if !ticket.is_current() {
            debug!(container, "bar chart render superseded");
            return Ok(RenderOutcome::Superseded);
        }
        let bars = bar_chart::render(surface, &dataset, &self.config.bar_chart)?;
        Ok(RenderOutcome::Drawn(bars))
    }

    /// Render the size scatter. Resolves to the number of points drawn.
    pub async fn scatter<S>(
        &self,
        container: &str,
        surface: &mut S,
    ) -> Result<RenderOutcome<usize>, ChartError>
    where
        S: DrawingSurface,
        ChartError: From<S::Error>,
    {
        let ticket = self.epochs.begin(container);
        let dataset = self.datasets.load(&self.config.dataset_path).await?;
        if !ticket.is_current() {
            debug!(container, "scatter render superseded");
            return Ok(RenderOutcome::Superseded);
        }
        let points = scatter::render(surface, &dataset, &self.config.scatter)?;
        Ok(RenderOutcome::Drawn(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    use dataset_source::{DatasetFuture, StaticSource};

    use crate::scene::Scene;
    use crate::surface::{Element, LogoFuture, Viewport};

    fn document() -> String {
        json!({
            "humanBaseline": 92.0,
            "companyColors": { "OpenAI": "#10a37f" },
            "companyLogos": { "OpenAI": "logos/openai.svg", "Moonshot": "logos/broken.png" },
            "models": [
                { "id": "openai/o1", "displayName": "o1", "company": "OpenAI", "type": "Reasoning",
                  "isClosed": true, "releaseDate": "2024-12-05", "avgSuccessRate": 12.0,
                  "taskSuccessRates": { "stack": 12.0 } },
                { "id": "moonshot/kimi-k2", "displayName": "Kimi K2", "company": "Moonshot", "type": "LLM",
                  "isClosed": false, "releaseDate": "2025-09-05", "avgSuccessRate": 18.5,
                  "taskSuccessRates": { "stack": 20.0 } }
            ]
        })
        .to_string()
    }

    /// A render of `container` to start, once, from inside a pass that is
    /// already underway.
    type Interrupt = Rc<RefCell<Option<(RenderEpochs, &'static str)>>>;

    fn fire(interrupt: &Interrupt) {
        if let Some((epochs, container)) = interrupt.borrow_mut().take() {
            epochs.begin(container);
        }
    }

    /// Loads everything except URLs containing "broken".
    #[derive(Default)]
    struct TestLoader {
        interrupt: Interrupt,
    }

    impl LogoLoader for TestLoader {
        fn load(&self, url: &str) -> LogoFuture {
            fire(&self.interrupt);
            let ok = !url.contains("broken");
            Box::pin(async move { ok })
        }
    }

    /// Static documents whose fetch can start a competing render.
    struct TestSource {
        documents: StaticSource,
        interrupt: Interrupt,
    }

    impl DatasetSource for TestSource {
        type Error = SourceError;

        fn fetch(&self, path: &str) -> DatasetFuture<SourceError> {
            fire(&self.interrupt);
            self.documents.fetch(path)
        }
    }

    fn renderer(loader: TestLoader) -> Renderer<TestSource, TestLoader> {
        renderer_with_source(loader, Interrupt::default())
    }

    fn renderer_with_source(loader: TestLoader, interrupt: Interrupt) -> Renderer<TestSource, TestLoader> {
        let source = TestSource {
            documents: StaticSource::new().with_document("data/model_data.json", document()),
            interrupt,
        };
        Renderer::new(ChartConfig::default(), source, loader)
    }

    fn scene(width: f64) -> Scene {
        Scene::new(Viewport {
            container_width: width,
            container_top: 80.0,
            window_height: 700.0,
        })
    }

    #[test]
    fn tickets_go_stale_when_a_newer_render_begins() {
        let epochs = RenderEpochs::default();
        let first = epochs.begin("timeline-chart");
        assert!(first.is_current());
        let other = epochs.begin("highlight-fig-1");
        let second = epochs.begin("timeline-chart");
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(other.is_current());
    }

    #[test]
    fn renders_all_three_charts_from_one_fetch() {
        let r = renderer(TestLoader::default());
        let mut timeline = scene(900.0);
        let mut bars = scene(500.0);
        let mut points = scene(500.0);

        let summary = block_on(r.timeline("timeline-chart", &mut timeline, None))
            .unwrap()
            .drawn()
            .unwrap();
        assert_eq!(summary.markers, 2);
        assert_eq!(summary.logos, 1);
        assert_eq!(timeline.count(Element::Image), 1);

        assert_eq!(block_on(r.bar_chart("highlight-fig-1", &mut bars)).unwrap(), RenderOutcome::Drawn(2));
        assert_eq!(block_on(r.scatter("highlight-fig-4", &mut points)).unwrap(), RenderOutcome::Drawn(2));
        assert!(r.datasets().is_cached("data/model_data.json"));
        assert!(points.to_svg().contains("Kimi K2"));
    }

    #[test]
    fn rerender_replaces_previous_scene() {
        let r = renderer(TestLoader::default());
        let mut s = scene(900.0);
        block_on(r.timeline("timeline-chart", &mut s, None)).unwrap();
        let svg = s.to_svg();
        block_on(r.timeline("timeline-chart", &mut s, None)).unwrap();
        assert_eq!(s.to_svg(), svg);
        assert_eq!(s.roots().len(), 1);
    }

    #[test]
    fn bar_chart_and_scatter_rerender_in_place() {
        let r = renderer(TestLoader::default());

        let mut bars = scene(500.0);
        block_on(r.bar_chart("highlight-fig-1", &mut bars)).unwrap();
        let (svg, nodes) = (bars.to_svg(), bars.len());
        assert_eq!(block_on(r.bar_chart("highlight-fig-1", &mut bars)).unwrap(), RenderOutcome::Drawn(2));
        assert_eq!(bars.to_svg(), svg);
        assert_eq!(bars.len(), nodes);
        assert_eq!(bars.roots().len(), 1);

        let mut points = scene(500.0);
        block_on(r.scatter("highlight-fig-4", &mut points)).unwrap();
        let (svg, nodes) = (points.to_svg(), points.len());
        assert_eq!(block_on(r.scatter("highlight-fig-4", &mut points)).unwrap(), RenderOutcome::Drawn(2));
        assert_eq!(points.to_svg(), svg);
        assert_eq!(points.len(), nodes);
        assert_eq!(points.roots().len(), 1);
    }

    #[test]
    fn newer_timeline_render_wins() {
        let interrupt = Interrupt::default();
        let r = renderer(TestLoader {
            interrupt: interrupt.clone(),
        });
        *interrupt.borrow_mut() = Some((r.epochs().clone(), "timeline-chart"));

        // A second render of the container starts while the first awaits its logos.
        let mut stale = scene(900.0);
        let outcome = block_on(r.timeline("timeline-chart", &mut stale, None)).unwrap();
        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(stale.is_empty());

        let mut fresh = scene(900.0);
        let summary = block_on(r.timeline("timeline-chart", &mut fresh, None))
            .unwrap()
            .drawn()
            .unwrap();
        assert_eq!(summary.markers, 2);
        assert!(!fresh.is_empty());
    }

    #[test]
    fn competing_render_of_another_container_does_not_supersede() {
        let interrupt = Interrupt::default();
        let r = renderer(TestLoader {
            interrupt: interrupt.clone(),
        });
        *interrupt.borrow_mut() = Some((r.epochs().clone(), "highlight-fig-1"));

        let mut s = scene(900.0);
        let outcome = block_on(r.timeline("timeline-chart", &mut s, None)).unwrap();
        assert!(outcome.drawn().is_some());
    }

    #[test]
    fn newer_bar_chart_and_scatter_renders_win() {
        let interrupt = Interrupt::default();
        let r = renderer_with_source(TestLoader::default(), interrupt.clone());

        // The interrupt fires from the first (uncached) fetch only.
        *interrupt.borrow_mut() = Some((r.epochs().clone(), "highlight-fig-1"));
        let mut bars = scene(500.0);
        assert_eq!(block_on(r.bar_chart("highlight-fig-1", &mut bars)).unwrap(), RenderOutcome::Superseded);
        assert!(bars.is_empty());
        assert_eq!(block_on(r.bar_chart("highlight-fig-1", &mut bars)).unwrap(), RenderOutcome::Drawn(2));

        let r = renderer_with_source(TestLoader::default(), interrupt.clone());
        *interrupt.borrow_mut() = Some((r.epochs().clone(), "highlight-fig-4"));
        let mut points = scene(500.0);
        assert_eq!(block_on(r.scatter("highlight-fig-4", &mut points)).unwrap(), RenderOutcome::Superseded);
        assert!(points.is_empty());
        assert_eq!(block_on(r.scatter("highlight-fig-4", &mut points)).unwrap(), RenderOutcome::Drawn(2));
    }

    #[test]
    fn stale_ticket_draws_nothing() {
        let r = renderer(TestLoader::default());
        let ticket = r.epochs().begin("timeline-chart");
        r.epochs().begin("timeline-chart");
        let mut s = scene(900.0);
        let outcome = block_on(r.timeline_pass(ticket, &mut s, None)).unwrap();
        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(s.is_empty());
    }

    #[test]
    fn missing_dataset_is_an_error() {
        let config = ChartConfig {
            dataset_path: "data/elsewhere.json".to_string(),
            ..ChartConfig::default()
        };
        let source = TestSource {
            documents: StaticSource::new(),
            interrupt: Interrupt::default(),
        };
        let r = Renderer::new(config, source, TestLoader::default());
        let mut s = scene(500.0);
        let err = block_on(r.bar_chart("highlight-fig-1", &mut s)).unwrap_err();
        assert!(matches!(err, ChartError::Source(SourceError::NotFound(_))));
        assert!(s.is_empty());
    }
}
