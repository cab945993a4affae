//! Per-frame transform and size resolution.
//!
//! A node's local transform is `translate(left, top) · rotate_about(θ,
//! center)`, where the pivot is the center of its own box. Absolute
//! transforms compose parent-first. Rotation only moves pixels: paint order
//! is always the document's child order.

use crate::fonts::{FontProvider, TextRun};
use kurbo::{Affine, BezPath, Point, Rect, Shape, Size};
use std::collections::HashMap;
use vellum_core::{Document, ImageFit, Node, NodeId, NodeKind, PathCmd};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    /// Relative to the parent's coordinate space.
    pub local: Affine,
    /// Relative to the canvas.
    pub transform: Affine,
    pub size: Size,
    /// Axis-aligned canvas bounds, inflated by half the stroke width.
    pub bounds: Rect,
}

impl NodeGeometry {
    pub fn local_rect(&self) -> Rect {
        self.size.to_rect()
    }

    /// Whether a canvas point falls inside the node's (possibly rotated) box.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.transform.inverse() * point;
        let r = self.local_rect();
        local.x >= r.x0 && local.x <= r.x1 && local.y >= r.y0 && local.y <= r.y1
    }
}

/// Resolved geometry for every visible node of one scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGeometry {
    entries: HashMap<NodeId, NodeGeometry>,
    order: Vec<NodeId>,
}

impl SceneGeometry {
    /// Resolve every active node of `scene_id`. Inactive nodes and their
    /// subtrees are left out, as are dangling references.
    pub fn resolve(doc: &Document, scene_id: NodeId, fonts: &dyn FontProvider) -> Self {
        let mut out = Self::default();
        let Some(scene) = doc.scene(scene_id) else {
            return out;
        };
        for &child in &scene.children {
            out.visit(doc, fonts, child, Affine::IDENTITY);
        }
        out
    }

    fn visit(&mut self, doc: &Document, fonts: &dyn FontProvider, id: NodeId, parent: Affine) {
        let Some(node) = doc.node(id) else {
            return;
        };
        if !node.active || self.entries.contains_key(&id) {
            return;
        }
        let size = measure(doc, fonts, node);
        let center = Point::new(size.width / 2.0, size.height / 2.0);
        let local = Affine::translate((node.left as f64, node.top as f64))
            * Affine::rotate_about((node.rotation as f64).to_radians(), center);
        let transform = parent * local;
        let half_stroke = (node.stroke_width.max(0.0) / 2.0) as f64;
        let bounds = transform
            .transform_rect_bbox(size.to_rect())
            .inflate(half_stroke, half_stroke);

        self.entries.insert(
            id,
            NodeGeometry {
                local,
                transform,
                size,
                bounds,
            },
        );
        self.order.push(id);
        for &child in node.children() {
            self.visit(doc, fonts, child, transform);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeGeometry> {
        self.entries.get(&id)
    }

    /// Visible node ids in paint order (pre-order, later siblings on top).
    pub fn paint_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Local box size. `auto` lengths are measured from content: text through
/// the font provider, paths from their bounding box, containers from the
/// extent of their children. Other kinds have no content and measure 0.
pub fn measure(doc: &Document, fonts: &dyn FontProvider, node: &Node) -> Size {
    let (fixed_w, fixed_h) = (node.width.fixed(), node.height.fixed());
    if let (Some(w), Some(h)) = (fixed_w, fixed_h) {
        return Size::new(w as f64, h as f64);
    }
    let content = match &node.kind {
        NodeKind::Text {
            text,
            font_family,
            font_size,
            font_weight,
            ..
        } => fonts.measure(
            &TextRun {
                text,
                font_family,
                font_size: *font_size,
                font_weight: *font_weight,
            },
            fixed_w,
        ),
        NodeKind::Vector { commands } => {
            let bbox = path_from(commands).bounding_box();
            Size::new(bbox.x1.max(0.0), bbox.y1.max(0.0))
        }
        NodeKind::Container { children, .. }
        | NodeKind::ComponentInstance { children, .. }
        | NodeKind::TemplateInstance { children, .. } => children
            .iter()
            .filter_map(|&c| doc.node(c))
            .filter(|c| c.active)
            .fold(Size::ZERO, |acc, child| {
                let s = measure(doc, fonts, child);
                Size::new(
                    acc.width.max(child.left as f64 + s.width),
                    acc.height.max(child.top as f64 + s.height),
                )
            }),
        NodeKind::Rectangle { .. }
        | NodeKind::Ellipse
        | NodeKind::Line
        | NodeKind::Image { .. } => Size::ZERO,
    };
    Size::new(
        fixed_w.map_or(content.width, f64::from),
        fixed_h.map_or(content.height, f64::from),
    )
}

pub fn path_from(commands: &[PathCmd]) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in commands {
        match *cmd {
            PathCmd::MoveTo(x, y) => bez.move_to((x as f64, y as f64)),
            PathCmd::LineTo(x, y) => bez.line_to((x as f64, y as f64)),
            PathCmd::QuadTo(cx, cy, ex, ey) => {
                bez.quad_to((cx as f64, cy as f64), (ex as f64, ey as f64))
            }
            PathCmd::CubicTo(c1x, c1y, c2x, c2y, ex, ey) => bez.curve_to(
                (c1x as f64, c1y as f64),
                (c2x as f64, c2y as f64),
                (ex as f64, ey as f64),
            ),
            PathCmd::Close => bez.close_path(),
        }
    }
    bez
}

/// Source and destination rects for drawing an `image` sized bitmap into a
/// `frame` sized box. Returns `None` when either is empty.
pub fn fit_rects(fit: ImageFit, image: Size, frame: Size) -> Option<(Rect, Rect)> {
    let empty = |s: Size| s.width <= 0.0 || s.height <= 0.0;
    if empty(image) || empty(frame) {
        return None;
    }
    let full_src = image.to_rect();
    let full_dst = frame.to_rect();
    let centered = |size: Size| {
        Rect::from_origin_size(
            ((frame.width - size.width) / 2.0, (frame.height - size.height) / 2.0),
            size,
        )
    };
    Some(match fit {
        ImageFit::Fill => (full_src, full_dst),
        ImageFit::Contain => {
            let scale = (frame.width / image.width).min(frame.height / image.height);
            (full_src, centered(image * scale))
        }
        ImageFit::Cover => {
            let scale = (frame.width / image.width).max(frame.height / image.height);
            let crop = frame * (1.0 / scale);
            let src = Rect::from_origin_size(
                ((image.width - crop.width) / 2.0, (image.height - crop.height) / 2.0),
                crop,
            );
            (src, full_dst)
        }
        ImageFit::None => {
            let dst = centered(image).intersect(full_dst);
            let offset = centered(image).origin();
            let src = dst - offset.to_vec2();
            (src, dst)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::ApproximateMetrics;
    use vellum_core::Length;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn rect(name: &str, left: f32, top: f32, w: f32, h: f32) -> Node {
        let mut node = Node::new(id(name), NodeKind::Rectangle { corner_radius: 0.0 });
        node.left = left;
        node.top = top;
        node.width = Length::Fixed(w);
        node.height = Length::Fixed(h);
        node
    }

    fn approx(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-6
    }

    #[test]
    fn translation_composes_through_parents() {
        let mut doc = Document::new();
        let mut frame = Node::new(id("g-frame"), NodeKind::container());
        frame.left = 100.0;
        frame.top = 50.0;
        frame.children_mut().unwrap().push(id("g-child"));
        doc.insert_node(frame);
        doc.insert_node(rect("g-child", 10.0, 5.0, 20.0, 20.0));
        doc.scene_mut(id("main")).unwrap().children.push(id("g-frame"));

        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        let child = geo.get(id("g-child")).unwrap();
        assert!(approx(child.transform * Point::ZERO, Point::new(110.0, 55.0)));
        // Auto-sized container spans its child.
        assert_eq!(geo.get(id("g-frame")).unwrap().size, Size::new(30.0, 25.0));
        assert_eq!(geo.paint_order(), &[id("g-frame"), id("g-child")]);
    }

    #[test]
    fn rotation_pivots_on_center() {
        let mut doc = Document::new();
        let mut node = rect("g-spin", 0.0, 0.0, 100.0, 50.0);
        node.rotation = 90.0;
        doc.insert_node(node);
        doc.scene_mut(id("main")).unwrap().children.push(id("g-spin"));

        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        let g = geo.get(id("g-spin")).unwrap();
        // Center is fixed under rotation.
        assert!(approx(g.transform * Point::new(50.0, 25.0), Point::new(50.0, 25.0)));
        // A 100x50 box turned 90 degrees covers 50x100 around the same center.
        let b = g.bounds;
        assert!((b.width() - 50.0).abs() < 1e-6 && (b.height() - 100.0).abs() < 1e-6);
        assert!(g.contains(Point::new(50.0, 90.0)));
        assert!(!g.contains(Point::new(5.0, 25.0)));
    }

    #[test]
    fn bounds_include_half_stroke() {
        let mut doc = Document::new();
        let mut node = rect("g-stroked", 10.0, 10.0, 10.0, 10.0);
        node.stroke_width = 4.0;
        doc.insert_node(node);
        doc.scene_mut(id("main")).unwrap().children.push(id("g-stroked"));
        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        assert_eq!(geo.get(id("g-stroked")).unwrap().bounds, Rect::new(8.0, 8.0, 22.0, 22.0));
    }

    #[test]
    fn inactive_subtrees_are_skipped() {
        let mut doc = Document::new();
        let mut node = rect("g-hidden", 0.0, 0.0, 10.0, 10.0);
        node.active = false;
        doc.insert_node(node);
        doc.scene_mut(id("main")).unwrap().children.push(id("g-hidden"));
        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        assert!(geo.is_empty());
    }

    #[test]
    fn fits() {
        let image = Size::new(200.0, 100.0);
        let frame = Size::new(100.0, 100.0);

        let (src, dst) = fit_rects(ImageFit::Fill, image, frame).unwrap();
        assert_eq!((src, dst), (image.to_rect(), frame.to_rect()));

        let (src, dst) = fit_rects(ImageFit::Contain, image, frame).unwrap();
        assert_eq!(src, image.to_rect());
        assert_eq!(dst, Rect::new(0.0, 25.0, 100.0, 75.0));

        let (src, dst) = fit_rects(ImageFit::Cover, image, frame).unwrap();
        assert_eq!(src, Rect::new(50.0, 0.0, 150.0, 100.0));
        assert_eq!(dst, frame.to_rect());

        let (src, dst) = fit_rects(ImageFit::None, image, frame).unwrap();
        assert_eq!(dst, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(src, Rect::new(50.0, 0.0, 150.0, 100.0));

        assert!(fit_rects(ImageFit::Cover, Size::ZERO, frame).is_none());
    }
}
