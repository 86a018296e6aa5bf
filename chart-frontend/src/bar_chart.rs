//! Highlight figure: average success rate of the best models.

use std::cmp::Ordering;

use tracing::debug;

use bench_core::{max_score, Dataset, ModelRecord};

use crate::attrs;
use crate::axis::{draw_bottom_axis, draw_grid, draw_left_axis, percent_ticks, AxisStyle, Tick};
use crate::config::BarChartConfig;
use crate::layout::{bar_y_max, ChartFrame, Margin, HIGHLIGHT_CHART_HEIGHT};
use crate::scale::{BandScale, LinearScale};
use crate::surface::{to_fixed, translate, DrawingSurface, Element};

pub const BAR_FALLBACK_COLOR: &str = "#76b900";
const BAND_PADDING: f64 = 0.3;

/// Best `n` models by average score, highest first. Equal scores keep file order.
pub fn top_models(models: &[ModelRecord], n: usize) -> Vec<&ModelRecord> {
    let mut ranked: Vec<&ModelRecord> = models.iter().collect();
    ranked.sort_by(|a, b| {
        b.avg_success_rate
            .partial_cmp(&a.avg_success_rate)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

pub(crate) const MUTED_VALUE_AXIS: AxisStyle<'static> = AxisStyle {
    domain_stroke: None,
    tick_stroke: None,
    label_fill: "#8888a0",
    font_size: "12px",
    label_rotation: None,
};

/// Clear the surface and draw the bar chart. Returns the number of bars.
pub fn render<S: DrawingSurface>(
    surface: &mut S,
    dataset: &Dataset,
    config: &BarChartConfig,
) -> Result<usize, S::Error> {
    surface.clear();
    let top = top_models(&dataset.models, config.top_n);
    let frame = ChartFrame::fixed(
        surface.viewport().container_width,
        HIGHLIGHT_CHART_HEIGHT,
        Margin::BAR,
    );
    let (width, height) = (frame.inner_width, frame.inner_height);

    let svg = surface.append_root(frame.outer_width(), frame.outer_height())?;
    let g = surface.append(&svg, Element::Group)?;
    surface.set_attr(&g, "transform", &translate(frame.margin.left, frame.margin.top));

    let x = BandScale::new(top.len(), width, BAND_PADDING);
    let y_max = bar_y_max(max_score(top.iter().copied()).unwrap_or(0.0));
    let y = LinearScale::new((0.0, y_max), (height, 0.0));
    let y_ticks = y.ticks(4);

    let grid_ys: Vec<f64> = y_ticks.iter().map(|v| y.map(*v)).collect();
    draw_grid(surface, &g, &grid_ys, width, "#e8eaed")?;

    for (i, model) in top.iter().enumerate() {
        let top_y = y.map(model.avg_success_rate);
        let bar = surface.append(&g, Element::Rect)?;
        attrs!(surface, &bar,
            "class" => "bar",
            "x" => x.position(i),
            "y" => top_y,
            "width" => x.bandwidth(),
            "height" => height - top_y,
            "fill" => dataset.color_or(&model.company, BAR_FALLBACK_COLOR),
            "rx" => 4.0,
            "opacity" => 0.85);
    }

    for (i, model) in top.iter().enumerate() {
        let label = surface.append(&g, Element::Text)?;
        attrs!(surface, &label,
            "class" => "bar-label",
            "x" => x.center(i),
            "y" => y.map(model.avg_success_rate) - 5.0,
            "text-anchor" => "middle",
            "font-size" => "12px",
            "font-weight" => "600",
            "fill" => "#4a4a6a");
        surface.set_text(&label, &format!("{}%", to_fixed(model.avg_success_rate, 1)));
    }

    let names: Vec<Tick> = top
        .iter()
        .enumerate()
        .map(|(i, m)| Tick::new(x.center(i), m.display_name.as_str()))
        .collect();
    draw_bottom_axis(
        surface,
        &g,
        &names,
        width,
        height,
        AxisStyle {
            domain_stroke: Some("#d0d4da"),
            tick_stroke: None,
            label_fill: "#4a4a6a",
            font_size: "12px",
            label_rotation: Some(-25.0),
        },
    )?;
    draw_left_axis(
        surface,
        &g,
        &percent_ticks(&y_ticks, |v| y.map(v)),
        height,
        MUTED_VALUE_AXIS,
    )?;

    debug!(bars = top.len(), y_max, "task bar chart rendered");
    Ok(top.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::scene::Scene;
    use crate::surface::Viewport;

    fn dataset(scores: &[(&str, &str, f64)]) -> Dataset {
        let models: Vec<_> = scores
            .iter()
            .map(|(id, company, score)| {
                json!({
                    "id": id, "displayName": id.to_uppercase(), "company": company,
                    "type": "LLM", "isClosed": true, "releaseDate": "2025-09-01",
                    "avgSuccessRate": score, "taskSuccessRates": {}
                })
            })
            .collect();
        let doc = json!({
            "humanBaseline": 90.0,
            "companyColors": { "OpenAI": "#10a37f" },
            "models": models
        });
        Dataset::from_json(&doc.to_string()).unwrap()
    }

    fn scene() -> Scene {
        Scene::new(Viewport {
            container_width: 600.0,
            container_top: 0.0,
            window_height: 800.0,
        })
    }

    #[test]
    fn ranks_top_n_stably() {
        let data = dataset(&[
            ("a", "X", 10.0),
            ("b", "X", 30.0),
            ("c", "X", 20.0),
            ("d", "X", 30.0),
            ("e", "X", 5.0),
            ("f", "X", 25.0),
        ]);
        let ids: Vec<&str> = top_models(&data.models, 5).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "f", "c", "a"]);
        assert_eq!(top_models(&data.models, 10).len(), 6);
    }

    #[test]
    fn draws_bars_labels_and_axes() {
        let data = dataset(&[("gpt", "OpenAI", 31.2), ("kimi", "Moonshot", 18.0)]);
        let mut s = scene();
        let bars = render(&mut s, &data, &BarChartConfig::default()).unwrap();
        assert_eq!(bars, 2);

        let rects = s.find_by_attr("class", "bar");
        assert_eq!(rects.len(), 2);
        assert_eq!(s.attr(rects[0], "fill"), Some("#10a37f"));
        assert_eq!(s.attr(rects[1], "fill"), Some(BAR_FALLBACK_COLOR));
        assert_eq!(s.attr(rects[0], "rx"), Some("4"));

        // yMax = max(40, 31.2 * 1.2) = 40, plot height 140.
        let y = s.attr_f64(rects[0], "y").unwrap();
        assert!((y - 140.0 * (1.0 - 31.2 / 40.0)).abs() < 1e-9);
        let h = s.attr_f64(rects[0], "height").unwrap();
        assert!((y + h - 140.0).abs() < 1e-9);

        assert!(s.find_text("31.2%").is_some());
        assert!(s.find_text("18.0%").is_some());
        let name = s.find_text("KIMI").unwrap();
        assert_eq!(s.attr(name, "transform"), Some("rotate(-25)"));
        for pct in ["0%", "10%", "20%", "30%", "40%"] {
            assert!(s.find_text(pct).is_some(), "missing {pct}");
        }
    }

    #[test]
    fn value_labels_round_halves_up() {
        let data = dataset(&[("kimi", "Moonshot", 18.25), ("glm", "Zhipu", 92.25)]);
        let mut s = scene();
        render(&mut s, &data, &BarChartConfig::default()).unwrap();
        let labels: Vec<&str> = s
            .find_by_attr("class", "bar-label")
            .into_iter()
            .filter_map(|n| s.text(n))
            .collect();
        assert_eq!(labels, vec!["92.3%", "18.3%"]);
    }

    #[test]
    fn value_axis_has_no_lines() {
        let data = dataset(&[("gpt", "OpenAI", 31.0)]);
        let mut s = scene();
        render(&mut s, &data, &BarChartConfig::default()).unwrap();
        let left = s.find_by_attr("class", "axis axis-left")[0];
        let lines = s
            .find_all(Element::Line)
            .into_iter()
            .filter(|l| s.attr(*l, "stroke") != Some("#e8eaed"))
            .count();
        assert_eq!(lines, 0);
        assert!(s
            .children(left)
            .iter()
            .all(|t| s.children(*t).len() == 1));
    }

    #[test]
    fn empty_dataset_draws_frame_only() {
        let data = dataset(&[]);
        let mut s = scene();
        assert_eq!(render(&mut s, &data, &BarChartConfig::default()).unwrap(), 0);
        assert!(s.find_by_attr("class", "bar").is_empty());
        assert_eq!(s.roots().len(), 1);
    }
}
