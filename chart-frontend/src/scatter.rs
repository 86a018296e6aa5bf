//! Highlight figure: approximate model size against average success rate.

use tracing::debug;

use bench_core::{Dataset, ModelRecord};

use crate::attrs;
use crate::axis::{draw_bottom_axis, draw_grid, draw_left_axis, percent_ticks, AxisStyle, Tick};
use crate::bar_chart::{BAR_FALLBACK_COLOR, MUTED_VALUE_AXIS};
use crate::config::ScatterConfig;
use crate::layout::{scatter_y_max, ChartFrame, Margin, HIGHLIGHT_CHART_HEIGHT};
use crate::scale::{size_label, LinearScale, LogScale};
use crate::surface::{translate, DrawingSurface, Element};

const POINT_RADIUS: f64 = 6.0;

/// Models that appear in the size table, paired with their size, in file order.
pub fn sized_models<'a>(
    models: &'a [ModelRecord],
    config: &ScatterConfig,
) -> Vec<(&'a ModelRecord, f64)> {
    models
        .iter()
        .filter_map(|m| config.size_of(&m.display_name).map(|size| (m, size)))
        .collect()
}

/// Clear the surface and draw the scatter plot. Returns the number of points.
pub fn render<S: DrawingSurface>(
    surface: &mut S,
    dataset: &Dataset,
    config: &ScatterConfig,
) -> Result<usize, S::Error> {
    surface.clear();
    let points = sized_models(&dataset.models, config);
    let frame = ChartFrame::fixed(
        surface.viewport().container_width,
        HIGHLIGHT_CHART_HEIGHT,
        Margin::SCATTER,
    );
    let (width, height) = (frame.inner_width, frame.inner_height);

    let svg = surface.append_root(frame.outer_width(), frame.outer_height())?;
    let g = surface.append(&svg, Element::Group)?;
    surface.set_attr(&g, "transform", &translate(frame.margin.left, frame.margin.top));

    let x = LogScale::new(config.size_domain, (0.0, width));
    let y_max = scatter_y_max(bench_core::max_score(points.iter().map(|(m, _)| *m)));
    let y = LinearScale::new((0.0, y_max), (height, 0.0));
    let y_ticks = y.ticks(4);

    let grid_ys: Vec<f64> = y_ticks.iter().map(|v| y.map(*v)).collect();
    draw_grid(surface, &g, &grid_ys, width, "#e8eaed")?;

    for (model, size) in &points {
        let dot = surface.append(&g, Element::Circle)?;
        attrs!(surface, &dot,
            "class" => "point",
            "cx" => x.map(*size),
            "cy" => y.map(model.avg_success_rate),
            "r" => POINT_RADIUS,
            "fill" => dataset.color_or(&model.company, BAR_FALLBACK_COLOR),
            "stroke" => "#fff",
            "stroke-width" => 1.5,
            "opacity" => 0.85);
    }

    for (model, size) in &points {
        let label = surface.append(&g, Element::Text)?;
        attrs!(surface, &label,
            "class" => "point-label",
            "x" => x.map(*size),
            "y" => y.map(model.avg_success_rate) - 10.0,
            "text-anchor" => "middle",
            "font-size" => "13px",
            "fill" => "#4a4a6a");
        surface.set_text(&label, &model.display_name);
    }

    let size_ticks: Vec<Tick> = x
        .ticks(4)
        .into_iter()
        .map(|v| Tick::new(x.map(v), size_label(v)))
        .collect();
    draw_bottom_axis(
        surface,
        &g,
        &size_ticks,
        width,
        height,
        AxisStyle {
            domain_stroke: Some("#d0d4da"),
            tick_stroke: Some("currentColor"),
            ..MUTED_VALUE_AXIS
        },
    )?;

    let title = surface.append(&g, Element::Text)?;
    attrs!(surface, &title,
        "x" => width / 2.0,
        "y" => height + 35.0,
        "text-anchor" => "middle",
        "fill" => "#4a4a6a",
        "font-size" => "13px");
    surface.set_text(&title, "Model Size (approx. params)");

    draw_left_axis(
        surface,
        &g,
        &percent_ticks(&y_ticks, |v| y.map(v)),
        height,
        MUTED_VALUE_AXIS,
    )?;

    debug!(points = points.len(), y_max, "size scatter rendered");
    Ok(points.len())
}
