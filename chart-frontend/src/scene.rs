//! In-memory [`DrawingSurface`]: a retained SVG tree with approximate text
//! metrics, simulated pointer dispatch and SVG serialization. Used for headless
//! rendering and by the tests of every chart.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use thiserror::Error;

use crate::surface::{BBox, DrawingSurface, Element, Viewport, SVG_NS};
use crate::tooltip::{
    escape_html, tooltip_position, HoverEffect, MarkerInteraction, PointerEvent, TooltipBounds,
    TooltipContent,
};

/// Average glyph advance as a share of the font size.
const GLYPH_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;
const ASCENT: f64 = 0.8;
const DEFAULT_FONT_SIZE: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0} does not belong to the current scene")]
    UnknownNode(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct SceneNode {
    element: Element,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeId>,
}

/// State of the single tooltip panel that belongs to the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipState {
    pub visible: bool,
    pub content: Option<Rc<TooltipContent>>,
    pub left: f64,
    pub top: f64,
}

/// How the scene answers "how tall is the tooltip panel right now".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum TooltipMeasure {
    #[default]
    Unknown,
    Fixed(f64),
    /// Header, company and average lines plus one line per task.
    PerLine(f64),
}

#[derive(Debug, Default)]
pub struct Scene {
    viewport: Viewport,
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    markers: HashMap<NodeId, MarkerInteraction>,
    tooltip: TooltipState,
    tooltip_measure: TooltipMeasure,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Pretend the tooltip panel measures `height` pixels when rendered.
    pub fn with_tooltip_height(mut self, height: f64) -> Self {
        self.tooltip_measure = TooltipMeasure::Fixed(height);
        self
    }

    /// Pretend the tooltip panel grows by `line_height` per line of its content.
    pub fn with_tooltip_line_height(mut self, line_height: f64) -> Self {
        self.tooltip_measure = TooltipMeasure::PerLine(line_height);
        self
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.get(node.0).map(|n| n.element)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| {
            n.attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn attr_f64(&self, node: NodeId, name: &str) -> Option<f64> {
        self.attr(node, name).and_then(leading_number)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| n.text.as_deref())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every node of the given kind, in document order.
    pub fn find_all(&self, element: Element) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.nodes[id.0].element == element)
            .collect()
    }

    pub fn count(&self, element: Element) -> usize {
        self.nodes.iter().filter(|n| n.element == element).count()
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.attr(*id, name) == Some(value))
            .collect()
    }

    pub fn find_text(&self, text: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.nodes[id.0].text.as_deref() == Some(text))
    }

    /// Nodes with a bound marker interaction, in document order.
    pub fn marker_nodes(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.markers.contains_key(id))
            .collect()
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    /// Feed a pointer event to the marker bound on `node` and apply its effects.
    /// Returns false when no marker is bound there.
    pub fn dispatch(&mut self, node: NodeId, event: PointerEvent) -> bool {
        let Some(marker) = self.markers.get_mut(&node) else {
            return false;
        };
        for effect in marker.handle(event) {
            match effect {
                HoverEffect::Transform(t) => self.put_attr(node, "transform", &t),
                HoverEffect::ShowTooltip(content) => {
                    self.tooltip.visible = true;
                    self.tooltip.content = Some(content);
                }
                HoverEffect::MoveTooltip { x, y } => {
                    let pos = tooltip_position(x, y, self.tooltip_bounds());
                    self.tooltip.left = pos.left;
                    self.tooltip.top = pos.top;
                }
                HoverEffect::HideTooltip => self.tooltip.visible = false,
            }
        }
        true
    }

    fn tooltip_bounds(&self) -> TooltipBounds {
        let content = self.tooltip.content.as_deref();
        let tooltip_height = match self.tooltip_measure {
            TooltipMeasure::Unknown => None,
            TooltipMeasure::Fixed(h) => Some(h),
            TooltipMeasure::PerLine(h) => content.map(|c| (3 + c.tasks.len()) as f64 * h),
        };
        TooltipBounds {
            width: self.viewport.container_width,
            height: self.wrapper_height(),
            tooltip_height,
        }
    }

    fn wrapper_height(&self) -> f64 {
        self.roots
            .first()
            .and_then(|root| self.attr_f64(*root, "height"))
            .unwrap_or(0.0)
    }

    fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn put_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(n) = self.nodes.get_mut(node.0) else {
            return;
        };
        match n.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => n.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn push(&mut self, element: Element) -> NodeId {
        self.nodes.push(SceneNode {
            element,
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Serialize the scene as standalone SVG markup.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.write_node(*root, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        let tag = node.element.tag();
        let _ = write!(out, "<{tag}");
        if node.element == Element::Svg {
            let _ = write!(out, " xmlns=\"{SVG_NS}\"");
        }
        for (k, v) in &node.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape_html(v));
        }
        if node.children.is_empty() && node.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape_html(text));
        }
        for child in &node.children {
            self.write_node(*child, out);
        }
        let _ = write!(out, "</{tag}>");
    }
}

/// `"12px"` → 12, `"0.85"` → 0.85.
fn leading_number(raw: &str) -> Option<f64> {
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e'))
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

impl DrawingSurface for Scene {
    type Node = NodeId;
    type Error = SceneError;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.markers.clear();
        self.tooltip = TooltipState::default();
    }

    fn append_root(&mut self, width: f64, height: f64) -> Result<NodeId, SceneError> {
        let id = self.push(Element::Svg);
        crate::attrs!(self, &id, "width" => width, "height" => height);
        self.roots.push(id);
        Ok(id)
    }

    fn append(&mut self, parent: &NodeId, element: Element) -> Result<NodeId, SceneError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent.0));
        }
        let id = self.push(element);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        self.put_attr(*node, name, value);
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.text = Some(text.to_string());
        }
    }

    fn text_bbox(&self, node: &NodeId) -> BBox {
        let font_size = self
            .attr_f64(*node, "font-size")
            .unwrap_or(DEFAULT_FONT_SIZE);
        let chars = self.text(*node).map(|t| t.chars().count()).unwrap_or(0);
        let width = chars as f64 * font_size * GLYPH_WIDTH;
        let height = font_size * LINE_HEIGHT;
        let x = self.attr_f64(*node, "x").unwrap_or(0.0);
        let y = self.attr_f64(*node, "y").unwrap_or(0.0);
        let left = match self.attr(*node, "text-anchor") {
            Some("end") => x - width,
            Some("middle") => x - width / 2.0,
            _ => x,
        };
        let top = match self.attr(*node, "dominant-baseline") {
            Some("central") | Some("middle") => y - height / 2.0,
            _ => y - font_size * ASCENT,
        };
        BBox {
            x: left,
            y: top,
            width,
            height,
        }
    }

    fn bind_marker(&mut self, node: &NodeId, interaction: MarkerInteraction) {
        self.markers.insert(*node, interaction);
    }
}
