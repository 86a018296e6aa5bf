//! Ports the render engine draws through: the scene surface, the optional
//! entrance animation and the logo image loader.

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;
use tracing::warn;

use crate::tooltip::MarkerInteraction;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// SVG element kinds the charts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Svg,
    Group,
    Defs,
    Pattern,
    ClipPath,
    Line,
    Rect,
    Circle,
    Path,
    Text,
    Image,
}

impl Element {
    pub fn tag(self) -> &'static str {
        match self {
            Element::Svg => "svg",
            Element::Group => "g",
            Element::Defs => "defs",
            Element::Pattern => "pattern",
            Element::ClipPath => "clipPath",
            Element::Line => "line",
            Element::Rect => "rect",
            Element::Circle => "circle",
            Element::Path => "path",
            Element::Text => "text",
            Element::Image => "image",
        }
    }
}

/// Container measurements taken at render time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Inner width of the chart container.
    pub container_width: f64,
    /// Distance from the top of the visible viewport to the container.
    pub container_top: f64,
    pub window_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Attribute value accepted by [`attrs!`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Num(f64),
    Str(Cow<'a, str>),
}

impl AttrValue<'_> {
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            AttrValue::Num(v) => Cow::Owned(fmt_num(*v)),
            AttrValue::Str(s) => Cow::Borrowed(s.as_ref()),
        }
    }
}

impl From<f64> for AttrValue<'_> {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

impl<'a> From<&'a str> for AttrValue<'a> {
    fn from(v: &'a str) -> Self {
        AttrValue::Str(Cow::Borrowed(v))
    }
}

impl<'a> From<&'a String> for AttrValue<'a> {
    fn from(v: &'a String) -> Self {
        AttrValue::Str(Cow::Borrowed(v.as_str()))
    }
}

impl From<String> for AttrValue<'_> {
    fn from(v: String) -> Self {
        AttrValue::Str(Cow::Owned(v))
    }
}

/// Shortest round-trip rendering, `10` rather than `10.0`.
pub fn fmt_num(v: f64) -> String {
    format!("{v}")
}

/// Every finite `f64` has a terminating decimal expansion within this many places.
const EXACT_DIGITS: usize = 1074;

/// Fixed-point rendering whose exact ties round away from zero, so `18.25`
/// gives `"18.3"` where `format!("{:.1}")` would give `"18.2"`.
pub fn to_fixed(v: f64, digits: usize) -> String {
    let rounded = format!("{v:.digits$}");
    if !v.is_finite() {
        return rounded;
    }
    let exact = format!("{:.*}", EXACT_DIGITS, v.abs());
    let Some(point) = exact.find('.') else {
        return rounded;
    };
    let tail = &exact[point + 1 + digits..];
    let tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !tie {
        return rounded;
    }
    // A quarter unit past the midpoint rounds the same way under any tie rule.
    let nudge = 10f64.powi(-(digits as i32)) / 4.0;
    format!("{:.digits$}", v + nudge.copysign(v))
}

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({},{})", fmt_num(x), fmt_num(y))
}

/// Set several attributes on one node: `attrs!(s, &node, "x" => 1.0, "fill" => "#fff")`.
#[macro_export]
macro_rules! attrs {
    ($surface:expr, $node:expr, $($name:literal => $value:expr),+ $(,)?) => {{
        $(
            $surface.set_attr(
                $node,
                $name,
                &$crate::surface::AttrValue::from($value).render(),
            );
        )+
    }};
}

/// Retained 2-D scene the charts are drawn into: a DOM container on the web,
/// an in-memory [`crate::scene::Scene`] headless.
pub trait DrawingSurface {
    type Node: Clone;
    type Error;

    fn viewport(&self) -> Viewport;

    /// Remove every element of a previous render from the container.
    fn clear(&mut self);

    /// Append the root `<svg>` of a new scene.
    fn append_root(&mut self, width: f64, height: f64) -> Result<Self::Node, Self::Error>;

    fn append(&mut self, parent: &Self::Node, element: Element) -> Result<Self::Node, Self::Error>;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Bounding box of a rendered text node in its parent's user space.
    fn text_bbox(&self, node: &Self::Node) -> BBox;

    /// Wire pointer enter/move/leave on `node` to a marker state machine.
    fn bind_marker(&mut self, node: &Self::Node, interaction: MarkerInteraction);
}

/// Entrance fade of one marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeIn {
    pub opacity: f64,
    pub delay_secs: f64,
    pub duration_secs: f64,
}

/// Optional animation capability. Without one, markers jump to their final opacity.
pub trait AnimationPort<S: DrawingSurface + ?Sized> {
    fn fade_in(&self, surface: &mut S, node: &S::Node, fade: FadeIn);
}

pub fn fade_in<S: DrawingSurface>(
    surface: &mut S,
    node: &S::Node,
    fade: FadeIn,
    animation: Option<&dyn AnimationPort<S>>,
) {
    match animation {
        Some(port) => port.fade_in(surface, node, fade),
        None => surface.set_attr(node, "opacity", &fmt_num(fade.opacity)),
    }
}

/// Resolves to whether the image at the URL loaded.
pub type LogoFuture = Pin<Box<dyn Future<Output = bool> + 'static>>;

pub trait LogoLoader {
    fn load(&self, url: &str) -> LogoFuture;
}

/// Logos that finished loading, by company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedLogos {
    by_company: HashMap<String, String>,
}

impl LoadedLogos {
    pub fn get(&self, company: &str) -> Option<&str> {
        self.by_company.get(company).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_company.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_company.is_empty()
    }
}

/// Start every logo load at once and wait for all of them. A failed load means
/// "no logo for that company"; it never fails the batch.
pub async fn preload_logos<L: LogoLoader + ?Sized>(
    loader: &L,
    logos: &HashMap<String, String>,
) -> LoadedLogos {
    let attempts = logos.iter().map(|(company, url)| {
        let pending = loader.load(url);
        async move { (company, url, pending.await) }
    });
    let mut by_company = HashMap::with_capacity(logos.len());
    for (company, url, loaded) in join_all(attempts).await {
        if loaded {
            by_company.insert(company.clone(), url.clone());
        } else {
            warn!(%company, %url, "logo failed to load, falling back to ring");
        }
    }
    LoadedLogos { by_company }
}
