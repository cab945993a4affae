//! The draw-surface contract and a recording implementation.
//!
//! [`Surface`] is the only place native graphics primitives are needed.
//! Geometry is given in the surface's current coordinate space, which the
//! pipeline sets up with `save` / `concat` / `restore`.

use crate::assets::Bitmap;
use kurbo::{Affine, BezPath, Line, Point, Rect, RoundedRect, Size, Stroke};
use peniko::{Color, Font};

/// Stroke paint plus geometry.
#[derive(Debug, Clone)]
pub struct StrokeStyle {
    pub color: Color,
    pub stroke: Stroke,
}

/// Fill and optional stroke for a closed shape. A missing paint arrives as
/// `Color::TRANSPARENT`, never as an absent fill.
#[derive(Debug, Clone)]
pub struct ShapeStyle {
    pub fill: Color,
    pub stroke: Option<StrokeStyle>,
}

/// A glyph positioned relative to the text origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Text after shaping by the font provider.
#[derive(Debug, Clone)]
pub struct ShapedText {
    pub text: String,
    /// Top-left of the laid-out block in local space.
    pub origin: Point,
    pub size: Size,
    pub font_size: f32,
    pub glyphs: Vec<PositionedGlyph>,
    /// Font data for backends that rasterize glyphs themselves.
    pub font: Option<Font>,
}

/// Minimal capability set the pipeline needs from its host.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn save(&mut self);
    fn restore(&mut self);
    /// Post-multiply the current transform.
    fn concat(&mut self, transform: Affine);
    /// Intersect the clip with `shape` until the matching `restore`.
    fn clip(&mut self, shape: &BezPath);
    fn draw_rect(&mut self, rect: RoundedRect, style: &ShapeStyle);
    fn draw_oval(&mut self, bounds: Rect, style: &ShapeStyle);
    fn draw_line(&mut self, line: Line, stroke: &StrokeStyle);
    fn draw_path(&mut self, path: &BezPath, style: &ShapeStyle);
    fn draw_text(&mut self, text: &ShapedText, color: Color);
    fn draw_image(&mut self, image: &Bitmap, src: Rect, dst: Rect, opacity: f32);
}

// ─── Display list ────────────────────────────────────────────────────────

/// One recorded surface call.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Clear(Color),
    Save,
    Restore,
    Concat(Affine),
    Clip(BezPath),
    Rect {
        rect: RoundedRect,
        style: ShapeStyle,
        transform: Affine,
    },
    Oval {
        bounds: Rect,
        style: ShapeStyle,
        transform: Affine,
    },
    Line {
        line: Line,
        stroke: StrokeStyle,
        transform: Affine,
    },
    Path {
        path: BezPath,
        style: ShapeStyle,
        transform: Affine,
    },
    Text {
        text: String,
        color: Color,
        transform: Affine,
    },
    Image {
        width: u32,
        height: u32,
        src: Rect,
        dst: Rect,
        opacity: f32,
        transform: Affine,
    },
}

impl DrawOp {
    /// True for the ops that put pixels on the surface.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DrawOp::Rect { .. }
                | DrawOp::Oval { .. }
                | DrawOp::Line { .. }
                | DrawOp::Path { .. }
                | DrawOp::Text { .. }
                | DrawOp::Image { .. }
        )
    }

    /// Absolute transform the op was drawn under, if it draws.
    pub fn transform(&self) -> Option<Affine> {
        match self {
            DrawOp::Rect { transform, .. }
            | DrawOp::Oval { transform, .. }
            | DrawOp::Line { transform, .. }
            | DrawOp::Path { transform, .. }
            | DrawOp::Text { transform, .. }
            | DrawOp::Image { transform, .. } => Some(*transform),
            DrawOp::Clear(_)
            | DrawOp::Save
            | DrawOp::Restore
            | DrawOp::Concat(_)
            | DrawOp::Clip(_) => None,
        }
    }
}

/// A [`Surface`] that records calls, for headless rendering and tests.
/// Tracks the transform stack so each draw op carries its absolute transform.
#[derive(Debug, Clone)]
pub struct DisplayList {
    pub ops: Vec<DrawOp>,
    transform: Affine,
    stack: Vec<Affine>,
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayList {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            transform: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    /// Recorded ops that draw, skipping state changes.
    pub fn draws(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| op.is_draw())
    }

    /// Save/restore nesting is balanced.
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
        self.stack.clear();
        self.transform = Affine::IDENTITY;
    }
}

impl Surface for DisplayList {
    fn clear(&mut self, color: Color) {
        self.ops.push(DrawOp::Clear(color));
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
        self.ops.push(DrawOp::Restore);
    }

    fn concat(&mut self, transform: Affine) {
        self.transform = self.transform * transform;
        self.ops.push(DrawOp::Concat(transform));
    }

    fn clip(&mut self, shape: &BezPath) {
        self.ops.push(DrawOp::Clip(shape.clone()));
    }

    fn draw_rect(&mut self, rect: RoundedRect, style: &ShapeStyle) {
        self.ops.push(DrawOp::Rect {
            rect,
            style: style.clone(),
            transform: self.transform,
        });
    }

    fn draw_oval(&mut self, bounds: Rect, style: &ShapeStyle) {
        self.ops.push(DrawOp::Oval {
            bounds,
            style: style.clone(),
            transform: self.transform,
        });
    }

    fn draw_line(&mut self, line: Line, stroke: &StrokeStyle) {
        self.ops.push(DrawOp::Line {
            line,
            stroke: stroke.clone(),
            transform: self.transform,
        });
    }

    fn draw_path(&mut self, path: &BezPath, style: &ShapeStyle) {
        self.ops.push(DrawOp::Path {
            path: path.clone(),
            style: style.clone(),
            transform: self.transform,
        });
    }

    fn draw_text(&mut self, text: &ShapedText, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.text.clone(),
            color,
            transform: self.transform,
        });
    }

    fn draw_image(&mut self, image: &Bitmap, src: Rect, dst: Rect, opacity: f32) {
        self.ops.push(DrawOp::Image {
            width: image.width,
            height: image.height,
            src,
            dst,
            opacity,
            transform: self.transform,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_stack_is_tracked() {
        let mut list = DisplayList::new();
        list.save();
        list.concat(Affine::translate((10.0, 20.0)));
        list.draw_rect(
            Rect::new(0.0, 0.0, 5.0, 5.0).to_rounded_rect(0.0),
            &ShapeStyle {
                fill: Color::TRANSPARENT,
                stroke: None,
            },
        );
        list.restore();
        list.draw_oval(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            &ShapeStyle {
                fill: Color::TRANSPARENT,
                stroke: None,
            },
        );

        let transforms: Vec<Affine> = list.draws().filter_map(DrawOp::transform).collect();
        assert_eq!(
            transforms,
            vec![Affine::translate((10.0, 20.0)), Affine::IDENTITY]
        );
        assert!(list.is_balanced());
    }
}
