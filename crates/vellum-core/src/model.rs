//! Node model for Vellum documents.
//!
//! A node is a closed tagged union keyed by `type` (rectangle, ellipse, text,
//! container, ...). Shared positional and paint properties live on [`Node`];
//! kind-specific data lives on [`NodeKind`]. Child references are ids, never
//! nested values; the [`crate::Document`] owns every node.

use crate::id::NodeId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long =
            |i: usize| Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0);

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Quantize to 8-bit channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Same color with alpha multiplied by `factor`.
    #[must_use]
    pub fn multiply_alpha(self, factor: f32) -> Self {
        Self {
            a: self.a * factor.clamp(0.0, 1.0),
            ..self
        }
    }
}

// ─── Paint ───────────────────────────────────────────────────────────────

fn yes() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn one() -> f32 {
    1.0
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// How an image is fitted into its node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    /// Scale to cover the box, cropping the overflow.
    #[default]
    Cover,
    /// Scale to fit inside the box, letterboxing.
    Contain,
    /// Stretch to the box, ignoring aspect ratio.
    Fill,
    /// Natural size, centered.
    None,
}

/// Fill or stroke paint.
///
/// Every variant carries an `active` flag; an inactive paint stays in the
/// list (so the user can toggle it back on) but never paints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Paint {
    Solid {
        color: Color,
        #[serde(default = "yes", skip_serializing_if = "is_true")]
        active: bool,
    },
    Image {
        src: String,
        #[serde(default)]
        fit: ImageFit,
        #[serde(default = "one")]
        opacity: f32,
        #[serde(default = "yes", skip_serializing_if = "is_true")]
        active: bool,
    },
    LinearGradient {
        angle: f32, // degrees
        stops: Vec<GradientStop>,
        #[serde(default = "yes", skip_serializing_if = "is_true")]
        active: bool,
    },
    RadialGradient {
        stops: Vec<GradientStop>,
        #[serde(default = "yes", skip_serializing_if = "is_true")]
        active: bool,
    },
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid {
            color,
            active: true,
        }
    }

    pub fn image(src: impl Into<String>, fit: ImageFit) -> Self {
        Paint::Image {
            src: src.into(),
            fit,
            opacity: 1.0,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Paint::Solid { active, .. }
            | Paint::Image { active, .. }
            | Paint::LinearGradient { active, .. }
            | Paint::RadialGradient { active, .. } => *active,
        }
    }

    /// Copy of this paint with its `active` flag replaced.
    #[must_use]
    pub fn with_active(mut self, value: bool) -> Self {
        match &mut self {
            Paint::Solid { active, .. }
            | Paint::Image { active, .. }
            | Paint::LinearGradient { active, .. }
            | Paint::RadialGradient { active, .. } => *active = value,
        }
        self
    }
}

/// Paint list as stored on a node. One inline slot covers the common case.
pub type Paints = SmallVec<[Paint; 1]>;

/// Where a node's fill (or stroke) comes from.
///
/// This is the single accessor over the two representations a node may
/// carry: the list-based `fill_paints` and the legacy single `fill`. When the
/// list is present it is authoritative, even if empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintSource<'a> {
    List(&'a [Paint]),
    Legacy(&'a Paint),
    None,
}

impl<'a> PaintSource<'a> {
    fn of(list: Option<&'a Paints>, legacy: Option<&'a Paint>) -> Self {
        match (list, legacy) {
            (Some(list), _) => PaintSource::List(list.as_slice()),
            (None, Some(paint)) => PaintSource::Legacy(paint),
            (None, None) => PaintSource::None,
        }
    }

    /// Active paints, bottom to top.
    pub fn active(self) -> impl DoubleEndedIterator<Item = &'a Paint> {
        let slice: &'a [Paint] = match self {
            PaintSource::List(list) => list,
            PaintSource::Legacy(paint) => std::slice::from_ref(paint),
            PaintSource::None => &[],
        };
        slice.iter().filter(|p| p.is_active())
    }

    /// The topmost active paint, or `None` (transparent).
    pub fn topmost(self) -> Option<&'a Paint> {
        self.active().next_back()
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// A width or height: a fixed length or `"auto"` (content-sized).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Length {
    Fixed(f32),
    #[default]
    Auto,
}

impl Length {
    pub fn fixed(self) -> Option<f32> {
        match self {
            Length::Fixed(v) => Some(v),
            Length::Auto => None,
        }
    }

    /// Resolve against a content measurement used when `Auto`.
    pub fn resolve(self, content: f32) -> f32 {
        self.fixed().unwrap_or(content)
    }
}

impl From<f32> for Length {
    fn from(v: f32) -> Self {
        Length::Fixed(v)
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Length::Fixed(v) => serializer.serialize_f32(*v),
            Length::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f32),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Length::Fixed(v)),
            Raw::Keyword(k) if k == "auto" => Ok(Length::Auto),
            Raw::Keyword(k) => Err(serde::de::Error::custom(format!(
                "expected a number or \"auto\", got {k:?}"
            ))),
        }
    }
}

/// Whether `left`/`top` are canvas-absolute offsets from the parent origin or
/// are owned by the parent's layout (flow children).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    #[default]
    Absolute,
    Relative,
}

/// A single path command (SVG-like but simplified), in node-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),            // control, end
    CubicTo(f32, f32, f32, f32, f32, f32), // c1, c2, end
    Close,
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignVertical {
    #[default]
    Top,
    Center,
    Bottom,
}

fn default_font_family() -> String {
    "Inter".into()
}

fn default_font_size() -> f32 {
    14.0
}

fn default_font_weight() -> u16 {
    400
}

// ─── Container layout ────────────────────────────────────────────────────

/// Children arrangement of a container. The solver itself is external;
/// the model only carries the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Children are positioned by their own `left`/`top`.
    #[default]
    Free,
    /// Children flow along `direction`.
    Flex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Kind-specific node data. Adding a variant forces every `match` in the
/// reducer and renderer to be revisited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Rectangle {
        #[serde(default, alias = "cornerRadius")]
        corner_radius: f32,
    },
    Ellipse,
    /// A horizontal segment of length `width`, rotated by the node rotation.
    Line,
    /// Freeform path (pen tool output).
    Vector {
        #[serde(default)]
        commands: Vec<PathCmd>,
    },
    Text {
        text: String,
        #[serde(default, alias = "textAlign")]
        text_align: TextAlign,
        #[serde(default, alias = "textAlignVertical")]
        text_align_vertical: TextAlignVertical,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_font_weight")]
        font_weight: u16,
    },
    Image {
        src: String,
        #[serde(default)]
        fit: ImageFit,
        #[serde(default, alias = "cornerRadius")]
        corner_radius: f32,
    },
    Container {
        #[serde(default)]
        children: Vec<NodeId>,
        #[serde(default)]
        layout: LayoutMode,
        #[serde(default)]
        direction: Axis,
        #[serde(default)]
        padding: Padding,
        #[serde(default)]
        gap: f32,
        #[serde(default, alias = "cornerRadius")]
        corner_radius: f32,
        #[serde(default)]
        clips_content: bool,
    },
    ComponentInstance {
        component_id: String,
        #[serde(default)]
        children: Vec<NodeId>,
    },
    TemplateInstance {
        template_id: String,
        #[serde(default)]
        children: Vec<NodeId>,
        #[serde(default)]
        props: BTreeMap<String, serde_json::Value>,
    },
}

impl NodeKind {
    /// The serialized `type` tag, also used as the prefix for fresh ids.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Rectangle { .. } => "rectangle",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Line => "line",
            NodeKind::Vector { .. } => "vector",
            NodeKind::Text { .. } => "text",
            NodeKind::Image { .. } => "image",
            NodeKind::Container { .. } => "container",
            NodeKind::ComponentInstance { .. } => "component_instance",
            NodeKind::TemplateInstance { .. } => "template_instance",
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text {
            text: text.into(),
            text_align: TextAlign::default(),
            text_align_vertical: TextAlignVertical::default(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
        }
    }

    pub fn container() -> Self {
        NodeKind::Container {
            children: Vec::new(),
            layout: LayoutMode::Free,
            direction: Axis::Horizontal,
            padding: Padding::default(),
            gap: 0.0,
            corner_radius: 0.0,
            clips_content: false,
        }
    }
}

/// A single drawable or structural element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "yes")]
    pub active: bool,
    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub position: Positioning,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub width: Length,
    #[serde(default)]
    pub height: Length,
    /// Degrees, clockwise, about the node's own center.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_paints: Option<Paints>,
    /// Legacy single fill; ignored whenever `fill_paints` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_paints: Option<Paints>,
    /// Legacy single stroke; ignored whenever `stroke_paints` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Paint>,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default)]
    pub stroke_cap: StrokeCap,
    #[serde(default)]
    pub stroke_join: StrokeJoin,

    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: String::new(),
            active: true,
            locked: false,
            position: Positioning::Absolute,
            left: 0.0,
            top: 0.0,
            width: Length::Auto,
            height: Length::Auto,
            rotation: 0.0,
            opacity: None,
            fill_paints: None,
            fill: None,
            stroke_paints: None,
            stroke: None,
            stroke_width: 0.0,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            kind,
        }
    }

    /// Child ids in paint order (later entries paint on top). Leaf kinds
    /// return an empty slice.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Container { children, .. }
            | NodeKind::ComponentInstance { children, .. }
            | NodeKind::TemplateInstance { children, .. } => children,
            NodeKind::Rectangle { .. }
            | NodeKind::Ellipse
            | NodeKind::Line
            | NodeKind::Vector { .. }
            | NodeKind::Text { .. }
            | NodeKind::Image { .. } => &[],
        }
    }

    /// Mutable child list, or `None` for kinds that cannot own children.
    pub fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Container { children, .. }
            | NodeKind::ComponentInstance { children, .. }
            | NodeKind::TemplateInstance { children, .. } => Some(children),
            NodeKind::Rectangle { .. }
            | NodeKind::Ellipse
            | NodeKind::Line
            | NodeKind::Vector { .. }
            | NodeKind::Text { .. }
            | NodeKind::Image { .. } => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Container { .. }
                | NodeKind::ComponentInstance { .. }
                | NodeKind::TemplateInstance { .. }
        )
    }

    pub fn fill_source(&self) -> PaintSource<'_> {
        PaintSource::of(self.fill_paints.as_ref(), self.fill.as_ref())
    }

    pub fn stroke_source(&self) -> PaintSource<'_> {
        PaintSource::of(self.stroke_paints.as_ref(), self.stroke.as_ref())
    }

    /// Topmost active fill, or `None` (transparent).
    pub fn effective_fill(&self) -> Option<&Paint> {
        self.fill_source().topmost()
    }

    /// Topmost active stroke, or `None` (transparent).
    pub fn effective_stroke(&self) -> Option<&Paint> {
        self.stroke_source().topmost()
    }

    /// The image currently shown by this node: the topmost active fill when
    /// it is an image paint, else an image node's own `src`.
    pub fn current_image(&self) -> Option<&str> {
        match self.effective_fill() {
            Some(Paint::Image { src, .. }) => Some(src),
            _ => match &self.kind {
                NodeKind::Image { src, .. } => Some(src),
                _ => None,
            },
        }
    }

    /// Replace the fill with a paint list. The legacy `fill` is cleared so
    /// only one representation stays authoritative.
    pub fn set_fill_paints(&mut self, paints: impl IntoIterator<Item = Paint>) {
        self.fill_paints = Some(paints.into_iter().collect());
        self.fill = None;
    }

    /// Stroke counterpart of [`Node::set_fill_paints`].
    pub fn set_stroke_paints(&mut self, paints: impl IntoIterator<Item = Paint>) {
        self.stroke_paints = Some(paints.into_iter().collect());
        self.stroke = None;
    }

    /// Corner radius for kinds that have one.
    pub fn corner_radius(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::Rectangle { corner_radius }
            | NodeKind::Image { corner_radius, .. }
            | NodeKind::Container { corner_radius, .. } => Some(*corner_radius),
            _ => None,
        }
    }

    pub fn corner_radius_mut(&mut self) -> Option<&mut f32> {
        match &mut self.kind {
            NodeKind::Rectangle { corner_radius }
            | NodeKind::Image { corner_radius, .. }
            | NodeKind::Container { corner_radius, .. } => Some(corner_radius),
            _ => None,
        }
    }

    /// Effective opacity in [0, 1]; absent means fully opaque.
    pub fn opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0).clamp(0.0, 1.0)
    }
}

// ─── Prototypes ──────────────────────────────────────────────────────────

/// A node template used by `insertNode`: everything but the id, plus nested
/// child prototypes. Ids are allocated at insertion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePrototype {
    pub node: Node,
    #[serde(default)]
    pub children: Vec<NodePrototype>,
}

impl NodePrototype {
    pub fn new(kind: NodeKind) -> Self {
        let mut node = Node::new(NodeId::intern(""), kind);
        node.name = node.kind.type_name().to_string();
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::new(NodeKind::Rectangle { corner_radius: 0.0 }).sized(width, height)
    }

    pub fn ellipse(width: f32, height: f32) -> Self {
        Self::new(NodeKind::Ellipse).sized(width, height)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::text(text))
    }

    pub fn image(src: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(NodeKind::Image {
            src: src.into(),
            fit: ImageFit::Cover,
            corner_radius: 0.0,
        })
        .sized(width, height)
    }

    pub fn container(width: f32, height: f32) -> Self {
        Self::new(NodeKind::container()).sized(width, height)
    }

    #[must_use]
    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.node.width = Length::Fixed(width);
        self.node.height = Length::Fixed(height);
        self
    }

    #[must_use]
    pub fn at(mut self, left: f32, top: f32) -> Self {
        self.node.left = left;
        self.node.top = top;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.node.name = name.into();
        self
    }

    #[must_use]
    pub fn with_fill(mut self, paint: Paint) -> Self {
        self.node.set_fill_paints([paint]);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<NodePrototype>) -> Self {
        self.children = children;
        self
    }

    /// Total number of nodes this prototype expands to.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NodePrototype::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(id: &str) -> Node {
        Node::new(NodeId::intern(id), NodeKind::Rectangle { corner_radius: 0.0 })
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#GG0000"), None);
    }

    #[test]
    fn effective_fill_prefers_topmost_active_entry() {
        let red = Paint::solid(Color::rgba(1.0, 0.0, 0.0, 1.0));
        let green = Paint::solid(Color::rgba(0.0, 1.0, 0.0, 1.0));
        let blue = Paint::solid(Color::rgba(0.0, 0.0, 1.0, 1.0)).with_active(false);

        let mut node = rect("paints");
        node.fill_paints = Some(SmallVec::from_vec(vec![red, green.clone(), blue]));
        assert_eq!(node.effective_fill(), Some(&green));
        assert_eq!(node.fill_source().active().count(), 2);
    }

    #[test]
    fn paint_list_is_authoritative_over_legacy_fill() {
        let mut node = rect("legacy");
        node.fill = Some(Paint::solid(Color::BLACK));
        assert_eq!(node.effective_fill(), Some(&Paint::solid(Color::BLACK)));

        // An empty list still wins: the node is transparent.
        node.fill_paints = Some(SmallVec::new());
        assert_eq!(node.effective_fill(), None);
    }

    #[test]
    fn missing_paint_resolves_to_none() {
        let node = rect("bare");
        assert_eq!(node.fill_source(), PaintSource::None);
        assert!(node.effective_fill().is_none());
        assert!(node.effective_stroke().is_none());
    }

    #[test]
    fn current_image_uses_topmost_image_paint() {
        let mut node = rect("hero");
        node.set_fill_paints([
            Paint::image("a.png", ImageFit::Cover),
            Paint::image("b.png", ImageFit::Cover),
            Paint::image("c.png", ImageFit::Cover).with_active(false),
        ]);
        assert_eq!(node.current_image(), Some("b.png"));

        let image = Node::new(
            NodeId::intern("photo"),
            NodeKind::Image {
                src: "photo.jpg".into(),
                fit: ImageFit::Contain,
                corner_radius: 4.0,
            },
        );
        assert_eq!(image.current_image(), Some("photo.jpg"));
    }

    #[test]
    fn set_fill_paints_clears_legacy() {
        let mut node = rect("migrate");
        node.fill = Some(Paint::solid(Color::BLACK));
        node.set_fill_paints([Paint::solid(Color::WHITE)]);
        assert!(node.fill.is_none());
        assert_eq!(node.effective_fill(), Some(&Paint::solid(Color::WHITE)));
    }

    #[test]
    fn node_json_shape() {
        let json = r##"{
            "id": "title",
            "type": "text",
            "text": "Hello",
            "textAlign": "center",
            "width": "auto",
            "height": 24,
            "fill": { "type": "solid", "color": { "r": 0, "g": 0, "b": 0, "a": 1 } }
        }"##;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, NodeId::intern("title"));
        assert!(node.active);
        assert_eq!(node.width, Length::Auto);
        assert_eq!(node.height, Length::Fixed(24.0));
        match &node.kind {
            NodeKind::Text {
                text,
                text_align,
                font_size,
                ..
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(*text_align, TextAlign::Center);
                assert_eq!(*font_size, 14.0);
            }
            other => panic!("expected text, got {other:?}"),
        }

        let back: Node = serde_json::from_str(&serde_json::to_string(&node).unwrap()).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn length_rejects_unknown_keyword() {
        assert!(serde_json::from_str::<Length>("\"fill\"").is_err());
        assert_eq!(serde_json::from_str::<Length>("12.5").unwrap(), Length::Fixed(12.5));
    }

    #[test]
    fn only_container_kinds_own_children() {
        let mut leaf = rect("leaf");
        assert!(leaf.children_mut().is_none());
        let mut frame = Node::new(NodeId::intern("frame"), NodeKind::container());
        frame.children_mut().unwrap().push(NodeId::intern("leaf"));
        assert_eq!(frame.children(), &[NodeId::intern("leaf")]);
    }

    #[test]
    fn prototype_counts_nested_nodes() {
        let proto = NodePrototype::container(200.0, 100.0).with_children(vec![
            NodePrototype::rectangle(10.0, 10.0),
            NodePrototype::container(50.0, 50.0)
                .with_children(vec![NodePrototype::text("label")]),
        ]);
        assert_eq!(proto.len(), 4);
    }
}
