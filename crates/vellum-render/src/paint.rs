//! Scene → surface calls.
//!
//! Walks one scene in document paint order and emits [`Surface`] calls:
//! shapes, strokes, text runs and bitmaps. Reads the document only; the
//! sole state it writes is the image cache and the frame statistics.

use crate::assets::{ImageCache, ImageLookup};
use crate::fonts::{FontProvider, TextRun};
use crate::geometry::{SceneGeometry, fit_rects, path_from};
use crate::surface::{ShapeStyle, StrokeStyle, Surface};
use kurbo::{BezPath, Cap, Ellipse, Join, Line, Point, Shape, Size, Stroke};
use peniko::Color;
use serde::Serialize;
use std::collections::HashSet;
use vellum_core::{
    Document, ImageFit, Node, NodeId, NodeKind, Paint, StrokeCap, StrokeJoin, TextAlign,
    TextAlignVertical,
};

/// What one paint pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub nodes_painted: usize,
    /// Image draws skipped because the bitmap is still loading.
    pub images_pending: usize,
    /// Image draws skipped because the load failed.
    pub images_failed: usize,
    /// Text runs skipped because their font is not ready.
    pub text_pending: usize,
}

/// Everything a paint pass may touch besides the read-only document.
pub struct PaintContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub images: &'a mut ImageCache,
    pub fonts: &'a dyn FontProvider,
    pub stats: FrameStats,
    /// Image sources drawn (or wanted) this frame.
    pub referenced: HashSet<String>,
    /// Font families that were not ready this frame.
    pub pending_fonts: HashSet<String>,
}

impl<'a> PaintContext<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        images: &'a mut ImageCache,
        fonts: &'a dyn FontProvider,
    ) -> Self {
        Self {
            surface,
            images,
            fonts,
            stats: FrameStats::default(),
            referenced: HashSet::new(),
            pending_fonts: HashSet::new(),
        }
    }
}

/// Paint every visible node of `scene_id`, bottom to top.
pub fn paint_scene(
    cx: &mut PaintContext<'_>,
    doc: &Document,
    geometry: &SceneGeometry,
    scene_id: NodeId,
) {
    let Some(scene) = doc.scene(scene_id) else {
        log::warn!("paint: unknown scene {scene_id}");
        return;
    };
    for &child in &scene.children {
        paint_node(cx, doc, geometry, child, 1.0);
    }
}

fn paint_node(
    cx: &mut PaintContext<'_>,
    doc: &Document,
    geometry: &SceneGeometry,
    id: NodeId,
    inherited: f32,
) {
    // Geometry only holds active, reachable nodes.
    let (Some(node), Some(geo)) = (doc.node(id), geometry.get(id)) else {
        return;
    };
    let opacity = inherited * node.opacity();
    let bounds = geo.local_rect();
    let style = ShapeStyle {
        fill: paint_to_color(node.effective_fill(), opacity),
        stroke: stroke_style(node, opacity),
    };

    cx.surface.save();
    cx.surface.concat(geo.local);

    match &node.kind {
        NodeKind::Rectangle { corner_radius } => {
            let shape = bounds.to_rounded_rect(*corner_radius as f64);
            cx.surface.draw_rect(shape, &style);
            paint_fill_image(cx, node, &shape.to_path(0.1), bounds.size(), opacity);
        }

        NodeKind::Ellipse => {
            cx.surface.draw_oval(bounds, &style);
            let clip = Ellipse::from_rect(bounds).to_path(0.1);
            paint_fill_image(cx, node, &clip, bounds.size(), opacity);
        }

        NodeKind::Line => {
            let line = Line::new(Point::ZERO, Point::new(bounds.width(), 0.0));
            let stroke = style.stroke.clone().unwrap_or(StrokeStyle {
                color: Color::TRANSPARENT,
                stroke: Stroke::new(0.0),
            });
            cx.surface.draw_line(line, &stroke);
        }

        NodeKind::Vector { commands } => {
            let path = path_from(commands);
            cx.surface.draw_path(&path, &style);
            paint_fill_image(cx, node, &path, bounds.size(), opacity);
        }

        NodeKind::Text {
            text,
            text_align,
            text_align_vertical,
            font_family,
            font_size,
            font_weight,
        } => {
            if cx.fonts.is_ready(font_family) {
                let run = TextRun {
                    text,
                    font_family,
                    font_size: *font_size,
                    font_weight: *font_weight,
                };
                let mut shaped = cx.fonts.shape(&run, node.width.fixed());
                shaped.origin = align_text(
                    shaped.size,
                    bounds.size(),
                    *text_align,
                    *text_align_vertical,
                );
                cx.surface.draw_text(&shaped, style.fill);
            } else {
                log::trace!("text {id} waiting for font {font_family}");
                cx.stats.text_pending += 1;
                cx.pending_fonts.insert(font_family.clone());
            }
        }

        NodeKind::Image {
            src,
            fit,
            corner_radius,
        } => {
            let shape = bounds.to_rounded_rect(*corner_radius as f64);
            cx.surface.draw_rect(shape, &style);
            let clip = shape.to_path(0.1);
            paint_fill_image(cx, node, &clip, bounds.size(), opacity);
            paint_bitmap(cx, src, *fit, &clip, bounds.size(), opacity);
        }

        NodeKind::Container {
            children,
            corner_radius,
            clips_content,
            ..
        } => {
            let shape = bounds.to_rounded_rect(*corner_radius as f64);
            cx.surface.draw_rect(shape, &style);
            let clip = shape.to_path(0.1);
            paint_fill_image(cx, node, &clip, bounds.size(), opacity);
            if *clips_content {
                cx.surface.clip(&clip);
            }
            for &child in children {
                paint_node(cx, doc, geometry, child, opacity);
            }
        }

        // Instances have no box of their own.
        NodeKind::ComponentInstance { children, .. }
        | NodeKind::TemplateInstance { children, .. } => {
            for &child in children {
                paint_node(cx, doc, geometry, child, opacity);
            }
        }
    }

    cx.surface.restore();
    cx.stats.nodes_painted += 1;
}

// ─── Images ──────────────────────────────────────────────────────────────────

/// Draw the topmost fill when it is an image paint. The shape itself was
/// already drawn transparent underneath.
fn paint_fill_image(
    cx: &mut PaintContext<'_>,
    node: &Node,
    clip: &BezPath,
    frame: Size,
    opacity: f32,
) {
    if let Some(Paint::Image {
        src,
        fit,
        opacity: paint_opacity,
        ..
    }) = node.effective_fill()
    {
        paint_bitmap(cx, src, *fit, clip, frame, opacity * paint_opacity.clamp(0.0, 1.0));
    }
}

fn paint_bitmap(
    cx: &mut PaintContext<'_>,
    src: &str,
    fit: ImageFit,
    clip: &BezPath,
    frame: Size,
    opacity: f32,
) {
    if src.is_empty() {
        return;
    }
    cx.referenced.insert(src.to_string());
    match cx.images.request(src) {
        ImageLookup::Ready(bitmap) => {
            let image_size = Size::new(bitmap.width as f64, bitmap.height as f64);
            let Some((from, to)) = fit_rects(fit, image_size, frame) else {
                return;
            };
            cx.surface.save();
            cx.surface.clip(clip);
            cx.surface.draw_image(&bitmap, from, to, opacity);
            cx.surface.restore();
        }
        ImageLookup::Pending => cx.stats.images_pending += 1,
        // Logged once by the cache when the load failed.
        ImageLookup::Failed(_) => cx.stats.images_failed += 1,
    }
}

// ─── Text ────────────────────────────────────────────────────────────────────

fn align_text(text: Size, frame: Size, align: TextAlign, vertical: TextAlignVertical) -> Point {
    let x = match align {
        TextAlign::Left | TextAlign::Justify => 0.0,
        TextAlign::Center => (frame.width - text.width) / 2.0,
        TextAlign::Right => frame.width - text.width,
    };
    let y = match vertical {
        TextAlignVertical::Top => 0.0,
        TextAlignVertical::Center => (frame.height - text.height) / 2.0,
        TextAlignVertical::Bottom => frame.height - text.height,
    };
    Point::new(x, y)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Stroke geometry whenever the width is positive, even with no visible
/// paint.
fn stroke_style(node: &Node, opacity: f32) -> Option<StrokeStyle> {
    if node.stroke_width <= 0.0 {
        return None;
    }
    let stroke = Stroke::new(node.stroke_width as f64)
        .with_join(map_join(node.stroke_join))
        .with_caps(map_cap(node.stroke_cap));
    Some(StrokeStyle {
        color: paint_to_color(node.effective_stroke(), opacity),
        stroke,
    })
}

fn map_cap(cap: StrokeCap) -> Cap {
    match cap {
        StrokeCap::Butt => Cap::Butt,
        StrokeCap::Round => Cap::Round,
        StrokeCap::Square => Cap::Square,
    }
}

fn map_join(join: StrokeJoin) -> Join {
    match join {
        StrokeJoin::Miter => Join::Miter,
        StrokeJoin::Round => Join::Round,
        StrokeJoin::Bevel => Join::Bevel,
    }
}

/// Flat color for a resolved paint. Gradients use their first stop; image
/// paints and `None` are transparent.
pub fn paint_to_color(paint: Option<&Paint>, opacity: f32) -> Color {
    let c = match paint {
        Some(Paint::Solid { color, .. }) => *color,
        Some(Paint::LinearGradient { stops, .. } | Paint::RadialGradient { stops, .. }) => stops
            .first()
            .map_or(vellum_core::Color::TRANSPARENT, |s| s.color),
        Some(Paint::Image { .. }) | None => vellum_core::Color::TRANSPARENT,
    }
    .multiply_alpha(opacity);
    Color::new([c.r, c.g, c.b, c.a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::GradientStop;

    #[test]
    fn null_and_image_paints_are_transparent() {
        assert_eq!(paint_to_color(None, 1.0).components, [0.0; 4]);
        let image = Paint::image("a.png", ImageFit::Cover);
        assert_eq!(paint_to_color(Some(&image), 1.0).components[3], 0.0);
    }

    #[test]
    fn opacity_scales_alpha() {
        let red = Paint::solid(vellum_core::Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(paint_to_color(Some(&red), 0.5).components, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn gradient_uses_first_stop() {
        let gradient = Paint::LinearGradient {
            angle: 90.0,
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: vellum_core::Color::rgba(0.0, 0.0, 1.0, 1.0),
                },
                GradientStop {
                    offset: 1.0,
                    color: vellum_core::Color::WHITE,
                },
            ],
            active: true,
        };
        assert_eq!(paint_to_color(Some(&gradient), 1.0).components, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn text_alignment_offsets() {
        let text = Size::new(20.0, 10.0);
        let frame = Size::new(100.0, 50.0);
        assert_eq!(
            align_text(text, frame, TextAlign::Center, TextAlignVertical::Bottom),
            Point::new(40.0, 40.0)
        );
        assert_eq!(
            align_text(text, frame, TextAlign::Right, TextAlignVertical::Center),
            Point::new(80.0, 20.0)
        );
    }

    #[test]
    fn zero_width_has_no_stroke() {
        let mut node = Node::new(NodeId::intern("p-line"), NodeKind::Line);
        assert!(stroke_style(&node, 1.0).is_none());
        node.stroke_width = 2.0;
        // Width counts even without a paint.
        let style = stroke_style(&node, 1.0).unwrap();
        assert_eq!(style.stroke.width, 2.0);
        assert_eq!(style.color.components[3], 0.0);
    }
}
