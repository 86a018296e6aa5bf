//! The main timeline: release date against average success rate, with the
//! human baseline shown above an axis break and the state-of-the-art frontier.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use bench_core::{Dataset, Frontier};

use crate::attrs;
use crate::axis::{draw_grid, draw_left_axis, percent_ticks, AxisStyle};
use crate::config::{TimeAxisConfig, TimelineConfig};
use crate::curve::monotone_x_path;
use crate::layout::{timeline_y_max, wavy_path, ChartFrame};
use crate::markers::{draw_marker, ClipIds, MarkerProps, MarkerStyle};
use crate::scale::{LinearScale, PiecewiseTimeScale};
use crate::surface::{
    fade_in, to_fixed, translate, AnimationPort, DrawingSurface, Element, FadeIn, LoadedLogos,
};

const GRID_STROKE: &str = "#e5e5e5";
const BASELINE_COLOR: &str = "#C0392B";
const FRONTIER_COLOR: &str = "#3B82F6";
const HATCH_ID: &str = "axis-break-hatch";

pub const BREAK_TOP: f64 = 4.0;
pub const BREAK_BOTTOM: f64 = 30.0;

const FADE_DELAY_SECS: f64 = 0.3;
const FADE_STAGGER_SECS: f64 = 0.08;
const FADE_DURATION_SECS: f64 = 0.5;

/// What one timeline render produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSummary {
    pub width: f64,
    pub height: f64,
    pub markers: usize,
    pub frontier: Vec<String>,
    pub logos: usize,
}

/// Entrance fade of the `index`-th drawn marker.
pub fn marker_fade(index: usize, opacity: f64) -> FadeIn {
    FadeIn {
        opacity,
        delay_secs: FADE_DELAY_SECS + index as f64 * FADE_STAGGER_SECS,
        duration_secs: FADE_DURATION_SECS,
    }
}

/// Clear the surface and draw the full timeline. Logos must already be loaded.
pub fn render<S: DrawingSurface>(
    surface: &mut S,
    dataset: &Dataset,
    logos: &LoadedLogos,
    config: &TimelineConfig,
    animation: Option<&dyn AnimationPort<S>>,
) -> Result<TimelineSummary, S::Error> {
    surface.clear();
    let frame = ChartFrame::timeline(surface.viewport(), config);
    let (width, height) = (frame.inner_width, frame.inner_height);

    let svg = surface.append_root(frame.outer_width(), frame.outer_height())?;
    let g = surface.append(&svg, Element::Group)?;
    surface.set_attr(&g, "transform", &translate(frame.margin.left, frame.margin.top));
    let defs = surface.append(&svg, Element::Defs)?;

    let x = config.axis.scale(width);
    let y_max = timeline_y_max(dataset.max_avg_success_rate().unwrap_or(0.0));
    let y = LinearScale::new((0.0, y_max), (height, 0.0));
    let y_ticks = y.ticks(5);

    let grid_ys: Vec<f64> = y_ticks.iter().map(|v| y.map(*v)).collect();
    draw_grid(surface, &g, &grid_ys, width, GRID_STROKE)?;
    draw_time_axis(surface, &g, &x, &config.axis, width, height)?;
    draw_left_axis(
        surface,
        &g,
        &percent_ticks(&y_ticks, |v| y.map(v)),
        height,
        AxisStyle {
            domain_stroke: Some(GRID_STROKE),
            tick_stroke: Some(GRID_STROKE),
            label_fill: "#666",
            font_size: "12px",
            label_rotation: None,
        },
    )?;

    let title = surface.append(&g, Element::Text)?;
    attrs!(surface, &title,
        "transform" => "rotate(-90)",
        "y" => -42.0,
        "x" => -height / 2.0,
        "text-anchor" => "middle",
        "fill" => "#666",
        "font-size" => "13px",
        "font-weight" => "600");
    surface.set_text(&title, "Avg. Success Rate (%)");

    draw_axis_break(surface, &defs, &g, dataset.human_baseline, width)?;

    let frontier = Frontier::compute(&dataset.models);
    if frontier.len() > 1 {
        let points: Vec<(f64, f64)> = frontier
            .members()
            .iter()
            .map(|m| (x.map_date(m.release_date), y.map(m.avg_success_rate)))
            .collect();
        let line = surface.append(&g, Element::Path)?;
        attrs!(surface, &line,
            "class" => "frontier",
            "d" => monotone_x_path(&points),
            "fill" => "none",
            "stroke" => FRONTIER_COLOR,
            "stroke-width" => 2.5,
            "stroke-dasharray" => "6,4",
            "opacity" => 0.6);
    }

    let (behind, ahead) = frontier.partition(&dataset.models);
    let ordered = behind
        .iter()
        .map(|m| (*m, false))
        .chain(ahead.iter().map(|m| (*m, true)));
    let mut clip_ids = ClipIds::default();
    let mut markers = 0;
    for (index, (model, sota)) in ordered.enumerate() {
        let props = MarkerProps {
            model,
            dataset,
            logos,
            center: (x.map_date(model.release_date), y.map(model.avg_success_rate)),
            sota,
        };
        let node = draw_marker(surface, &defs, &g, &props, &mut clip_ids)?;
        fade_in(surface, &node, marker_fade(index, MarkerStyle::new(sota).opacity), animation);
        markers = index + 1;
    }

    let summary = TimelineSummary {
        width: frame.outer_width(),
        height: frame.outer_height(),
        markers,
        frontier: frontier.members().iter().map(|m| m.id.clone()).collect(),
        logos: logos.len(),
    };
    debug!(
        markers = summary.markers,
        frontier = summary.frontier.len(),
        width = summary.width,
        height = summary.height,
        "timeline rendered"
    );
    Ok(summary)
}

/// Baseline, month ticks inside `[0, width]`, and dashed dividers at each
/// new year strictly inside the plot.
fn draw_time_axis<S: DrawingSurface>(
    surface: &mut S,
    g: &S::Node,
    x: &PiecewiseTimeScale,
    axis_config: &TimeAxisConfig,
    width: f64,
    height: f64,
) -> Result<(), S::Error> {
    let axis = surface.append(g, Element::Group)?;
    attrs!(surface, &axis, "class" => "axis axis-time", "transform" => translate(0.0, height));

    let base = surface.append(&axis, Element::Line)?;
    attrs!(surface, &base, "x1" => 0.0, "x2" => width, "stroke" => GRID_STROKE);

    for year in year_starts(axis_config.start, axis_config.end) {
        let tx = x.map_date(year);
        if tx <= 0.0 || tx >= width {
            continue;
        }
        let divider = surface.append(g, Element::Line)?;
        attrs!(surface, &divider,
            "class" => "year-divider",
            "x1" => tx,
            "x2" => tx,
            "y1" => 0.0,
            "y2" => height,
            "stroke" => "#ccc",
            "stroke-width" => 1.0,
            "stroke-dasharray" => "4,3");

        let label = surface.append(&axis, Element::Text)?;
        attrs!(surface, &label,
            "x" => tx,
            "y" => 34.0,
            "text-anchor" => "middle",
            "fill" => "#000",
            "font-size" => "12px",
            "font-weight" => "700");
        surface.set_text(&label, &year.year().to_string());
    }

    for date in &axis_config.ticks {
        let tx = x.map_date(*date);
        if tx < 0.0 || tx > width {
            continue;
        }
        let mark = surface.append(&axis, Element::Line)?;
        attrs!(surface, &mark, "x1" => tx, "x2" => tx, "y1" => 0.0, "y2" => 5.0, "stroke" => GRID_STROKE);

        let label = surface.append(&axis, Element::Text)?;
        attrs!(surface, &label,
            "x" => tx,
            "y" => 20.0,
            "text-anchor" => "middle",
            "fill" => "#666",
            "font-size" => "12px");
        surface.set_text(&label, &date.format("%b").to_string());
    }
    Ok(())
}

/// Every January 1st strictly between `start` and `end`.
fn year_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    (start.year() + 1..=end.year())
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .filter(|d| *d > start && *d < end)
        .collect()
}

/// Hatched band at the top of the plot standing for the cut-off part of the
/// value axis, with the human baseline drawn through its middle.
fn draw_axis_break<S: DrawingSurface>(
    surface: &mut S,
    defs: &S::Node,
    g: &S::Node,
    human_baseline: f64,
    width: f64,
) -> Result<(), S::Error> {
    let mid = (BREAK_TOP + BREAK_BOTTOM) / 2.0;

    let pattern = surface.append(defs, Element::Pattern)?;
    attrs!(surface, &pattern,
        "id" => HATCH_ID,
        "patternUnits" => "userSpaceOnUse",
        "width" => 8.0,
        "height" => 8.0);
    let hatch = surface.append(&pattern, Element::Path)?;
    attrs!(surface, &hatch, "d" => "M0,8 L8,0", "stroke" => "#ccc", "stroke-width" => 1.0);

    let band = surface.append(g, Element::Rect)?;
    attrs!(surface, &band,
        "class" => "axis-break",
        "x" => 0.0,
        "y" => BREAK_TOP,
        "width" => width,
        "height" => BREAK_BOTTOM - BREAK_TOP,
        "fill" => format!("url(#{HATCH_ID})"));

    for edge in [BREAK_TOP, BREAK_BOTTOM] {
        let wave = surface.append(g, Element::Path)?;
        attrs!(surface, &wave,
            "d" => wavy_path(edge, width),
            "fill" => "none",
            "stroke" => "#999",
            "stroke-width" => 1.5);
    }

    let baseline = surface.append(g, Element::Line)?;
    attrs!(surface, &baseline,
        "class" => "human-baseline",
        "x1" => 0.0,
        "x2" => width,
        "y1" => mid,
        "y2" => mid,
        "stroke" => BASELINE_COLOR,
        "stroke-width" => 2.0,
        "stroke-dasharray" => "8,4",
        "opacity" => 0.7);

    // The background goes in first so the label paints over it; it is sized
    // once the label can be measured.
    let background = surface.append(g, Element::Rect)?;
    attrs!(surface, &background, "fill" => BASELINE_COLOR, "rx" => 0.0);
    let label = surface.append(g, Element::Text)?;
    attrs!(surface, &label,
        "x" => width - 8.0,
        "y" => mid,
        "text-anchor" => "end",
        "dominant-baseline" => "central",
        "fill" => "#fff",
        "font-size" => "13px",
        "font-weight" => "700",
        "letter-spacing" => "0.02em");
    surface.set_text(&label, &format!("Human Baseline: {}%", to_fixed(human_baseline, 1)));

    let bbox = surface.text_bbox(&label);
    attrs!(surface, &background,
        "x" => bbox.x - 6.0,
        "y" => bbox.y - 3.0,
        "width" => bbox.width + 12.0,
        "height" => bbox.height + 6.0);
    Ok(())
}
