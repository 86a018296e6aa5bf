//! Chart frames: margins, inner drawing area and value-axis headroom.

use crate::config::TimelineConfig;
use crate::surface::{fmt_num, Viewport};

/// Fixed outer height of the bar and scatter charts.
pub const HIGHLIGHT_CHART_HEIGHT: f64 = 220.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const TIMELINE: Margin = Margin {
        top: 20.0,
        right: 50.0,
        bottom: 40.0,
        left: 60.0,
    };
    pub const BAR: Margin = Margin {
        top: 20.0,
        right: 20.0,
        bottom: 60.0,
        left: 50.0,
    };
    pub const SCATTER: Margin = Margin {
        top: 20.0,
        right: 20.0,
        bottom: 40.0,
        left: 50.0,
    };
}

/// Outer size of a chart and the plot area inside its margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartFrame {
    pub margin: Margin,
    pub inner_width: f64,
    pub inner_height: f64,
}

impl ChartFrame {
    /// Inner sizes never go negative, however narrow the container.
    pub fn fixed(container_width: f64, outer_height: f64, margin: Margin) -> Self {
        Self {
            margin,
            inner_width: (container_width - margin.left - margin.right).max(0.0),
            inner_height: (outer_height - margin.top - margin.bottom).max(0.0),
        }
    }

    pub fn timeline(viewport: Viewport, config: &TimelineConfig) -> Self {
        Self::fixed(
            viewport.container_width,
            timeline_outer_height(viewport, config),
            Margin::TIMELINE,
        )
    }

    pub fn outer_width(&self) -> f64 {
        self.inner_width + self.margin.left + self.margin.right
    }

    pub fn outer_height(&self) -> f64 {
        self.inner_height + self.margin.top + self.margin.bottom
    }
}

/// The timeline fills the rest of the viewport below its container, within bounds.
pub fn timeline_outer_height(viewport: Viewport, config: &TimelineConfig) -> f64 {
    let available = viewport.window_height - viewport.container_top - config.reserve_below;
    available.max(config.min_height).min(config.max_height)
}

/// Next multiple of 5 above the best score plus room for the baseline band.
pub fn timeline_y_max(max_score: f64) -> f64 {
    (max_score / 5.0).ceil() * 5.0 + 10.0
}

pub fn bar_y_max(max_score: f64) -> f64 {
    (max_score * 1.2).max(40.0)
}

/// Without any plotted value the scatter falls back to the bar chart floor.
pub fn scatter_y_max(max_score: Option<f64>) -> f64 {
    match max_score {
        Some(v) if v > 0.0 => v * 1.2,
        _ => 40.0,
    }
}

/// Zig-zag border of the axis break, starting at `(0, y)` and covering `width`.
pub fn wavy_path(y: f64, width: f64) -> String {
    let mut d = format!("M0,{}", fmt_num(y));
    let mut x = 0.0;
    while x < width {
        d.push_str(" l5,-3 l5,3");
        x += 10.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: f64, top: f64, window: f64) -> Viewport {
        Viewport {
            container_width: width,
            container_top: top,
            window_height: window,
        }
    }

    #[test]
    fn timeline_height_is_clamped() {
        let cfg = TimelineConfig::default();
        assert_eq!(timeline_outer_height(viewport(800.0, 100.0, 600.0), &cfg), 420.0);
        assert_eq!(timeline_outer_height(viewport(800.0, 500.0, 600.0), &cfg), 250.0);
        assert_eq!(timeline_outer_height(viewport(800.0, 0.0, 2000.0), &cfg), 500.0);
    }

    #[test]
    fn narrow_containers_do_not_go_negative() {
        let frame = ChartFrame::fixed(40.0, 50.0, Margin::BAR);
        assert_eq!(frame.inner_width, 0.0);
        assert_eq!(frame.inner_height, 0.0);

        let frame = ChartFrame::fixed(600.0, HIGHLIGHT_CHART_HEIGHT, Margin::SCATTER);
        assert_eq!(frame.inner_width, 530.0);
        assert_eq!(frame.inner_height, 160.0);
        assert_eq!(frame.outer_width(), 600.0);
        assert_eq!(frame.outer_height(), 220.0);
    }

    #[test]
    fn y_max_headroom() {
        assert_eq!(timeline_y_max(31.2), 45.0);
        assert_eq!(timeline_y_max(35.0), 45.0);
        assert_eq!(bar_y_max(20.0), 40.0);
        assert_eq!(bar_y_max(50.0), 60.0);
        assert_eq!(scatter_y_max(None), 40.0);
        assert!((scatter_y_max(Some(30.0)) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn wavy_path_covers_width() {
        assert_eq!(wavy_path(4.0, 20.0), "M0,4 l5,-3 l5,3 l5,-3 l5,3");
        assert_eq!(wavy_path(4.0, 25.0).matches("l5,3").count(), 3);
        assert_eq!(wavy_path(30.0, 0.0), "M0,30");
    }
}
