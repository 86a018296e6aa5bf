//! Model badges on the timeline: a ringed circle, an optional clipped logo and
//! a name label, wired to the hover state machine.

use std::collections::HashSet;

use bench_core::{Dataset, ModelRecord};

use crate::attrs;
use crate::surface::{translate, DrawingSurface, Element, LoadedLogos};
use crate::tooltip::{MarkerInteraction, TooltipContent};

pub const LOGO_SIZE: f64 = 28.0;
pub const SOTA_LOGO_SIZE: f64 = LOGO_SIZE + 4.0;
pub const NON_SOTA_OPACITY: f64 = 0.75;

/// Size-dependent look of a badge. Frontier models are bigger, bolder and
/// labelled above instead of below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub size: f64,
    pub stroke_width: f64,
    pub opacity: f64,
    pub label_y: f64,
    pub label_font_size: &'static str,
    pub label_font_weight: &'static str,
}

impl MarkerStyle {
    pub fn new(sota: bool) -> Self {
        if sota {
            Self {
                size: SOTA_LOGO_SIZE,
                stroke_width: 2.5,
                opacity: 1.0,
                label_y: -(SOTA_LOGO_SIZE / 2.0 + 12.0),
                label_font_size: "13px",
                label_font_weight: "700",
            }
        } else {
            Self {
                size: LOGO_SIZE,
                stroke_width: 1.5,
                opacity: NON_SOTA_OPACITY,
                label_y: LOGO_SIZE / 2.0 + 14.0,
                label_font_size: "11px",
                label_font_weight: "500",
            }
        }
    }
}

/// Clip path id for a model. Any character that is not safe in a fragment
/// identifier becomes `-`.
pub fn clip_id(model_id: &str) -> String {
    let safe: String = model_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("clip-model-{safe}")
}

/// Clip path ids handed out during one render. Model ids that sanitise to the
/// same [`clip_id`] get a numeric suffix so every id stays unique in the page.
#[derive(Debug, Default)]
pub struct ClipIds {
    taken: HashSet<String>,
}

impl ClipIds {
    pub fn allocate(&mut self, model_id: &str) -> String {
        let base = clip_id(model_id);
        let mut id = base.clone();
        let mut n = 2;
        while self.taken.contains(&id) {
            id = format!("{base}-{n}");
            n += 1;
        }
        self.taken.insert(id.clone());
        id
    }
}

/// Everything needed to place one badge.
pub struct MarkerProps<'a> {
    pub model: &'a ModelRecord,
    pub dataset: &'a Dataset,
    pub logos: &'a LoadedLogos,
    pub center: (f64, f64),
    pub sota: bool,
}

/// Draw the badge group (initially transparent) and bind its hover behaviour.
pub fn draw_marker<S: DrawingSurface>(
    surface: &mut S,
    defs: &S::Node,
    parent: &S::Node,
    props: &MarkerProps<'_>,
    clip_ids: &mut ClipIds,
) -> Result<S::Node, S::Error> {
    let MarkerProps {
        model,
        dataset,
        logos,
        center: (cx, cy),
        sota,
    } = *props;
    let style = MarkerStyle::new(sota);
    let color = dataset.company_color(&model.company);

    let group = surface.append(parent, Element::Group)?;
    attrs!(surface, &group,
        "class" => if sota { "model-marker sota" } else { "model-marker" },
        "data-model-id" => model.id.as_str(),
        "transform" => translate(cx, cy),
        "opacity" => 0.0,
        "style" => "cursor: pointer");

    let ring = surface.append(&group, Element::Circle)?;
    attrs!(surface, &ring,
        "r" => style.size / 2.0 + 2.0,
        "fill" => "#fff",
        "stroke" => color,
        "stroke-width" => style.stroke_width,
        "stroke-dasharray" => if model.is_closed { "none" } else { "4,2" });

    if let Some(href) = logos.get(&model.company) {
        let id = clip_ids.allocate(&model.id);
        let clip = surface.append(defs, Element::ClipPath)?;
        surface.set_attr(&clip, "id", &id);
        let circle = surface.append(&clip, Element::Circle)?;
        attrs!(surface, &circle, "cx" => 0.0, "cy" => 0.0, "r" => style.size / 2.0 - 1.0);

        let image = surface.append(&group, Element::Image)?;
        attrs!(surface, &image,
            "href" => href,
            "x" => -style.size / 2.0 + 1.0,
            "y" => -style.size / 2.0 + 1.0,
            "width" => style.size - 2.0,
            "height" => style.size - 2.0,
            "clip-path" => format!("url(#{id})"),
            "preserveAspectRatio" => "xMidYMid slice");
    }

    let label = surface.append(&group, Element::Text)?;
    attrs!(surface, &label,
        "y" => style.label_y,
        "text-anchor" => "middle",
        "fill" => color,
        "font-size" => style.label_font_size,
        "font-weight" => style.label_font_weight);
    surface.set_text(&label, &model.display_name);

    surface.bind_marker(
        &group,
        MarkerInteraction::new((cx, cy), TooltipContent::for_model(model, dataset)),
    );
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_ids_are_fragment_safe() {
        assert_eq!(clip_id("openai/gpt-5.2"), "clip-model-openai-gpt-5-2");
        assert_eq!(clip_id("qwen3_235b"), "clip-model-qwen3_235b");
        assert_eq!(clip_id("a b#c"), "clip-model-a-b-c");
    }

    #[test]
    fn colliding_clip_ids_get_suffixes() {
        let mut ids = ClipIds::default();
        assert_eq!(ids.allocate("a/b"), "clip-model-a-b");
        assert_eq!(ids.allocate("a.b"), "clip-model-a-b-2");
        assert_eq!(ids.allocate("a b"), "clip-model-a-b-3");
        assert_eq!(ids.allocate("a-b-2"), "clip-model-a-b-2-2");
        assert_eq!(ids.allocate("openai/o1"), "clip-model-openai-o1");
    }

    #[test]
    fn sota_badges_are_larger_and_labelled_above() {
        let sota = MarkerStyle::new(true);
        let plain = MarkerStyle::new(false);
        assert_eq!(sota.size, 32.0);
        assert_eq!(plain.size, 28.0);
        assert_eq!(sota.label_y, -28.0);
        assert_eq!(plain.label_y, 28.0);
        assert_eq!(sota.opacity, 1.0);
        assert_eq!(plain.opacity, 0.75);
    }
}
