//! Axis and grid drawing shared by the three charts. Geometry follows the usual
//! SVG axis layout: 6 px ticks, labels 9 px past the tick.

use crate::attrs;
use crate::surface::{fmt_num, translate, DrawingSurface, Element};

const TICK_SIZE: f64 = 6.0;
const LABEL_OFFSET: f64 = 9.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

impl Tick {
    pub fn new(position: f64, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// `"{v}%"` value ticks.
pub fn percent_ticks(values: &[f64], map: impl Fn(f64) -> f64) -> Vec<Tick> {
    values
        .iter()
        .map(|v| Tick::new(map(*v), format!("{}%", fmt_num(*v))))
        .collect()
}

/// Colors and which axis parts to draw. `None` leaves the part out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStyle<'a> {
    pub domain_stroke: Option<&'a str>,
    pub tick_stroke: Option<&'a str>,
    pub label_fill: &'a str,
    pub font_size: &'a str,
    /// Rotation of bottom-axis labels, anchored at their end.
    pub label_rotation: Option<f64>,
}

/// Left value axis over `[0, height]`.
pub fn draw_left_axis<S: DrawingSurface>(
    surface: &mut S,
    parent: &S::Node,
    ticks: &[Tick],
    height: f64,
    style: AxisStyle<'_>,
) -> Result<S::Node, S::Error> {
    let axis = surface.append(parent, Element::Group)?;
    attrs!(surface, &axis,
        "class" => "axis axis-left",
        "fill" => "none",
        "font-size" => "10",
        "font-family" => "sans-serif",
        "text-anchor" => "end");

    if let Some(stroke) = style.domain_stroke {
        let domain = surface.append(&axis, Element::Path)?;
        attrs!(surface, &domain,
            "class" => "domain",
            "stroke" => stroke,
            "d" => format!("M-{t},{h}H0V0H-{t}", t = fmt_num(TICK_SIZE), h = fmt_num(height)));
    }

    for tick in ticks {
        let g = surface.append(&axis, Element::Group)?;
        attrs!(surface, &g, "class" => "tick", "transform" => translate(0.0, tick.position));
        if let Some(stroke) = style.tick_stroke {
            let line = surface.append(&g, Element::Line)?;
            attrs!(surface, &line, "stroke" => stroke, "x2" => -TICK_SIZE);
        }
        let text = surface.append(&g, Element::Text)?;
        attrs!(surface, &text,
            "fill" => style.label_fill,
            "font-size" => style.font_size,
            "x" => -LABEL_OFFSET,
            "dy" => "0.32em");
        surface.set_text(&text, &tick.label);
    }
    Ok(axis)
}

/// Bottom axis along `[0, width]`, translated down to `y`.
pub fn draw_bottom_axis<S: DrawingSurface>(
    surface: &mut S,
    parent: &S::Node,
    ticks: &[Tick],
    width: f64,
    y: f64,
    style: AxisStyle<'_>,
) -> Result<S::Node, S::Error> {
    let axis = surface.append(parent, Element::Group)?;
    attrs!(surface, &axis,
        "class" => "axis axis-bottom",
        "transform" => translate(0.0, y),
        "fill" => "none",
        "font-size" => "10",
        "font-family" => "sans-serif",
        "text-anchor" => "middle");

    if let Some(stroke) = style.domain_stroke {
        let domain = surface.append(&axis, Element::Path)?;
        attrs!(surface, &domain,
            "class" => "domain",
            "stroke" => stroke,
            "d" => format!("M0,{t}V0H{w}V{t}", t = fmt_num(TICK_SIZE), w = fmt_num(width)));
    }

    for tick in ticks {
        let g = surface.append(&axis, Element::Group)?;
        attrs!(surface, &g, "class" => "tick", "transform" => translate(tick.position, 0.0));
        if let Some(stroke) = style.tick_stroke {
            let line = surface.append(&g, Element::Line)?;
            attrs!(surface, &line, "stroke" => stroke, "y2" => TICK_SIZE);
        }
        let text = surface.append(&g, Element::Text)?;
        attrs!(surface, &text,
            "fill" => style.label_fill,
            "font-size" => style.font_size,
            "y" => LABEL_OFFSET,
            "dy" => "0.71em");
        if let Some(angle) = style.label_rotation {
            attrs!(surface, &text,
                "transform" => format!("rotate({})", fmt_num(angle)),
                "text-anchor" => "end");
        }
        surface.set_text(&text, &tick.label);
    }
    Ok(axis)
}

/// Horizontal grid lines across the plot at each `y`.
pub fn draw_grid<S: DrawingSurface>(
    surface: &mut S,
    parent: &S::Node,
    ys: &[f64],
    width: f64,
    stroke: &str,
) -> Result<S::Node, S::Error> {
    let grid = surface.append(parent, Element::Group)?;
    surface.set_attr(&grid, "class", "grid-lines");
    for y in ys {
        let line = surface.append(&grid, Element::Line)?;
        attrs!(surface, &line,
            "x1" => 0.0,
            "x2" => width,
            "y1" => *y,
            "y2" => *y,
            "stroke" => stroke,
            "stroke-width" => 0.5);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::surface::Viewport;

    const MUTED: AxisStyle<'static> = AxisStyle {
        domain_stroke: None,
        tick_stroke: None,
        label_fill: "#8888a0",
        font_size: "12px",
        label_rotation: None,
    };

    #[test]
    fn left_axis_without_domain_or_tick_lines() {
        let mut scene = Scene::new(Viewport::default());
        let svg = scene.append_root(100.0, 100.0).unwrap();
        let ticks = percent_ticks(&[0.0, 20.0, 40.0], |v| 100.0 - v);
        draw_left_axis(&mut scene, &svg, &ticks, 100.0, MUTED).unwrap();

        assert_eq!(scene.count(Element::Path), 0);
        assert_eq!(scene.count(Element::Line), 0);
        let label = scene.find_text("20%").unwrap();
        assert_eq!(scene.attr(label, "fill"), Some("#8888a0"));
        let tick = scene.find_by_attr("class", "tick")[1];
        assert_eq!(scene.attr(tick, "transform"), Some("translate(0,80)"));
    }

    #[test]
    fn bottom_axis_rotates_labels() {
        let mut scene = Scene::new(Viewport::default());
        let svg = scene.append_root(100.0, 100.0).unwrap();
        let style = AxisStyle {
            domain_stroke: Some("#d0d4da"),
            label_rotation: Some(-25.0),
            ..MUTED
        };
        let axis = draw_bottom_axis(
            &mut scene,
            &svg,
            &[Tick::new(10.0, "GPT-5.2"), Tick::new(50.0, "o1")],
            80.0,
            60.0,
            style,
        )
        .unwrap();
        assert_eq!(scene.attr(axis, "transform"), Some("translate(0,60)"));
        let domain = scene.find_by_attr("class", "domain")[0];
        assert_eq!(scene.attr(domain, "d"), Some("M0,6V0H80V6"));
        let label = scene.find_text("o1").unwrap();
        assert_eq!(scene.attr(label, "transform"), Some("rotate(-25)"));
        assert_eq!(scene.attr(label, "text-anchor"), Some("end"));
    }

    #[test]
    fn grid_has_one_line_per_tick() {
        let mut scene = Scene::new(Viewport::default());
        let svg = scene.append_root(100.0, 100.0).unwrap();
        draw_grid(&mut scene, &svg, &[0.0, 50.0, 100.0], 90.0, "#e5e5e5").unwrap();
        assert_eq!(scene.count(Element::Line), 3);
    }
}
