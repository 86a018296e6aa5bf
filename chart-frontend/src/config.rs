use chrono::NaiveDate;
use serde::Deserialize;

use crate::scale::PiecewiseTimeScale;
use crate::ChartError;

/// Page global that may hold a JSON override of [`ChartConfig`].
pub const CONFIG_GLOBAL: &str = "BENCHMARK_CHART_CONFIG";

/// Everything the render entry points need to know about the page. Built once
/// at startup and passed down; never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub dataset_path: String,
    pub timeline: TimelineConfig,
    pub bar_chart: BarChartConfig,
    pub scatter: ScatterConfig,
    /// Quiet period after the last resize event before charts re-render.
    pub resize_debounce_ms: u32,
    /// Viewports at most this wide scroll the timeline panel to its newest data.
    pub narrow_viewport_px: f64,
    pub timeline_panel_selector: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            dataset_path: dataset_source::DEFAULT_DATASET_PATH.to_string(),
            timeline: TimelineConfig::default(),
            bar_chart: BarChartConfig::default(),
            scatter: ScatterConfig::default(),
            resize_debounce_ms: 250,
            narrow_viewport_px: 768.0,
            timeline_panel_selector: ".chart-panel".to_string(),
        }
    }
}

impl ChartConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ChartError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ChartError::Config(e.to_string()))?;
        if !value.is_object() {
            return Err(ChartError::Config("config must be a JSON object".to_string()));
        }
        let config: ChartConfig =
            serde_json::from_value(value).map_err(|e| ChartError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        self.timeline.axis.validate()?;
        let (lo, hi) = self.scatter.size_domain;
        if !(lo > 0.0 && hi > lo) {
            return Err(ChartError::Config(format!(
                "size domain must be positive and increasing, got [{lo}, {hi}]"
            )));
        }
        let t = &self.timeline;
        if t.min_height > t.max_height {
            return Err(ChartError::Config(format!(
                "timeline min height {} exceeds max height {}",
                t.min_height, t.max_height
            )));
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl ChartConfig {
    /// Defaults, overridden by [`CONFIG_GLOBAL`] when the page sets it. A broken
    /// override is logged and ignored.
    pub fn from_global() -> Self {
        let Some(text) = crate::dom::read_global(CONFIG_GLOBAL) else {
            return Self::default();
        };
        Self::from_json(&text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring {CONFIG_GLOBAL}");
            Self::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    pub container_id: String,
    pub tooltip_id: String,
    pub axis: TimeAxisConfig,
    pub min_height: f64,
    pub max_height: f64,
    /// Space kept free under the chart for the legend and section padding.
    pub reserve_below: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            container_id: "timeline-chart".to_string(),
            tooltip_id: "timeline-tooltip".to_string(),
            axis: TimeAxisConfig::default(),
            min_height: 250.0,
            max_height: 500.0,
            reserve_below: 80.0,
        }
    }
}

/// Time axis policy of the timeline. With a breakpoint the axis is piecewise,
/// without one it is uniform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeAxisConfig {
    pub start: NaiveDate,
    pub breakpoint: Option<NaiveDate>,
    pub end: NaiveDate,
    /// Share of the width given to `[start, breakpoint]`.
    pub breakpoint_fraction: f64,
    /// Explicit tick dates; automatic ticks assume a uniform domain.
    pub ticks: Vec<NaiveDate>,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl Default for TimeAxisConfig {
    fn default() -> Self {
        Self {
            start: ymd(2024, 8, 1),
            breakpoint: Some(ymd(2025, 7, 1)),
            end: ymd(2026, 1, 15),
            breakpoint_fraction: 0.2,
            ticks: vec![
                ymd(2024, 9, 1),
                ymd(2025, 1, 1),
                ymd(2025, 4, 1),
                ymd(2025, 7, 1),
                ymd(2025, 8, 1),
                ymd(2025, 9, 1),
                ymd(2025, 10, 1),
                ymd(2025, 11, 1),
                ymd(2025, 12, 1),
                ymd(2026, 1, 1),
            ],
        }
    }
}

impl TimeAxisConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.start >= self.end {
            return Err(ChartError::Config(format!(
                "time axis start {} must precede end {}",
                self.start, self.end
            )));
        }
        if let Some(b) = self.breakpoint {
            if !(self.start < b && b < self.end) {
                return Err(ChartError::Config(format!(
                    "breakpoint {b} must lie strictly inside [{}, {}]",
                    self.start, self.end
                )));
            }
            if !(self.breakpoint_fraction > 0.0 && self.breakpoint_fraction < 1.0) {
                return Err(ChartError::Config(format!(
                    "breakpoint fraction {} must be in (0, 1)",
                    self.breakpoint_fraction
                )));
            }
        }
        Ok(())
    }

    pub fn scale(&self, width: f64) -> PiecewiseTimeScale {
        match self.breakpoint {
            Some(b) => {
                PiecewiseTimeScale::new(self.start, b, self.end, self.breakpoint_fraction, width)
            }
            None => PiecewiseTimeScale::uniform(self.start, self.end, width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarChartConfig {
    pub container_id: String,
    /// Number of best-scoring models shown.
    pub top_n: usize,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            container_id: "highlight-fig-1".to_string(),
            top_n: 5,
        }
    }
}

/// Approximate parameter count of a model, in billions. Display data only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSize {
    pub display_name: String,
    pub billions: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScatterConfig {
    pub container_id: String,
    pub size_domain: (f64, f64),
    pub model_sizes: Vec<ModelSize>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        let sizes = [
            ("GPT-5.2", 1800.0),
            ("GPT-5.1", 1500.0),
            ("Gemini 3 Pro", 1200.0),
            ("Opus 4.5", 1000.0),
            ("o1", 900.0),
            ("o4-mini", 200.0),
            ("Haiku 4.5", 150.0),
            ("GPT-OSS-120B", 120.0),
            ("GPT-OSS-20B", 20.0),
            ("Qwen3-235B", 235.0),
            ("Kimi K2", 235.0),
            ("DeepSeek 3.1", 600.0),
        ];
        Self {
            container_id: "highlight-fig-4".to_string(),
            size_domain: (10.0, 2000.0),
            model_sizes: sizes
                .into_iter()
                .map(|(name, billions)| ModelSize {
                    display_name: name.to_string(),
                    billions,
                })
                .collect(),
        }
    }
}

impl ScatterConfig {
    pub fn size_of(&self, display_name: &str) -> Option<f64> {
        self.model_sizes
            .iter()
            .find(|s| s.display_name == display_name)
            .map(|s| s.billions)
            .filter(|b| *b > 0.0)
    }
}
