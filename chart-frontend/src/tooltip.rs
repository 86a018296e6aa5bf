//! Marker hover state machine and tooltip placement.

use std::rc::Rc;

use bench_core::{Dataset, ModelRecord};

use crate::surface::{fmt_num, to_fixed, translate};

/// Marker scale while hovered.
pub const HOVER_SCALE: f64 = 1.15;
/// Hover transition length on surfaces that animate attribute changes.
pub const HOVER_TRANSITION_MS: u32 = 150;

pub const TOOLTIP_WIDTH: f64 = 280.0;
const OFFSET_X: f64 = 16.0;
const OFFSET_Y: f64 = 10.0;
const FLIP_X: f64 = 290.0;
const EDGE_MARGIN: f64 = 10.0;

/// Pointer positions are relative to the chart wrapper (the container's parent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    Hovered,
}

/// Space available to the tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipBounds {
    pub width: f64,
    pub height: f64,
    /// Measured tooltip height, when the surface can tell.
    pub tooltip_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPosition {
    pub left: f64,
    pub top: f64,
}

/// Place the tooltip right of and slightly above the pointer, flipping left when it
/// would overflow the right edge and upward when it would overflow the bottom.
pub fn tooltip_position(x: f64, y: f64, bounds: TooltipBounds) -> TooltipPosition {
    let mut left = x + OFFSET_X;
    let mut top = y - OFFSET_Y;

    if left + TOOLTIP_WIDTH > bounds.width {
        left = (x - FLIP_X).max(0.0);
    }
    if top < 0.0 {
        top = EDGE_MARGIN;
    }
    if let Some(h) = bounds.tooltip_height {
        if bounds.height > 0.0 && top + h > bounds.height {
            top = (y - h - OFFSET_Y).max(EDGE_MARGIN);
        }
    }
    TooltipPosition { left, top }
}

/// What the tooltip panel shows for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub title_color: String,
    /// "company · type · Closed Source"
    pub subtitle: String,
    pub average: String,
    /// (task, "12.5%" or "N/A") in file order.
    pub tasks: Vec<(String, String)>,
}

impl TooltipContent {
    pub fn for_model(model: &ModelRecord, dataset: &Dataset) -> Self {
        let tasks = model
            .task_success_rates
            .iter()
            .map(|t| {
                let value = match t.rate {
                    Some(v) => format!("{}%", fmt_num(v)),
                    None => "N/A".to_string(),
                };
                (t.name.clone(), value)
            })
            .collect();
        Self {
            title: model.display_name.clone(),
            title_color: dataset.color_or(&model.company, "#333").to_string(),
            subtitle: format!(
                "{} \u{b7} {} \u{b7} {} Source",
                model.company,
                model.model_type,
                model.license_label()
            ),
            average: format!("{}%", to_fixed(model.avg_success_rate, 1)),
            tasks,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<div class=\"tooltip-header\" style=\"color: {}\">{}</div>\
             <div class=\"tooltip-company\">{}</div>\
             <div class=\"tooltip-stat\" style=\"font-weight:600; margin-bottom:0.4rem;\">\
             <span>Avg Success Rate</span><span>{}</span></div>\
             <hr style=\"border:none;border-top:1px solid #e8eaed;margin:0.3rem 0;\">",
            escape_html(&self.title_color),
            escape_html(&self.title),
            escape_html(&self.subtitle),
            escape_html(&self.average),
        );
        for (task, value) in &self.tasks {
            html.push_str(&format!(
                "<div class=\"tooltip-stat\"><span class=\"task-name\">{}</span>\
                 <span class=\"task-value\">{}</span></div>",
                escape_html(task),
                escape_html(value)
            ));
        }
        html
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Side effects a surface applies for a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverEffect {
    /// New `transform` of the marker group.
    Transform(String),
    ShowTooltip(Rc<TooltipContent>),
    /// Place the panel for a pointer at `(x, y)`. Surfaces resolve it with
    /// [`tooltip_position`] against the panel as currently filled.
    MoveTooltip { x: f64, y: f64 },
    HideTooltip,
}

/// Idle/hovered state of one marker.
#[derive(Debug, Clone)]
pub struct MarkerInteraction {
    anchor: (f64, f64),
    content: Rc<TooltipContent>,
    state: HoverState,
}

impl MarkerInteraction {
    pub fn new(anchor: (f64, f64), content: TooltipContent) -> Self {
        Self {
            anchor,
            content: Rc::new(content),
            state: HoverState::Idle,
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    fn transform(&self, scale: f64) -> String {
        format!(
            "{} scale({})",
            translate(self.anchor.0, self.anchor.1),
            fmt_num(scale)
        )
    }

    /// Advance the state machine. Events that don't apply to the current state
    /// (a move or leave while idle, a second enter) produce no effects.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<HoverEffect> {
        match (self.state, event) {
            (HoverState::Idle, PointerEvent::Enter { x, y }) => {
                self.state = HoverState::Hovered;
                vec![
                    HoverEffect::Transform(self.transform(HOVER_SCALE)),
                    HoverEffect::ShowTooltip(self.content.clone()),
                    HoverEffect::MoveTooltip { x, y },
                ]
            }
            (HoverState::Hovered, PointerEvent::Move { x, y }) => {
                vec![HoverEffect::MoveTooltip { x, y }]
            }
            (HoverState::Hovered, PointerEvent::Leave) => {
                self.state = HoverState::Idle;
                vec![
                    HoverEffect::Transform(self.transform(1.0)),
                    HoverEffect::HideTooltip,
                ]
            }
            _ => Vec::new(),
        }
    }
}
