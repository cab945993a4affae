//! [`Surface`] on a Vello scene.
//!
//! Vello has no transform stack, so this keeps one, with the number of clip
//! layers pushed at each level. The caller presents the scene via wgpu,
//! passing [`VelloSurface::base_color`] as the render base color.

use crate::assets::Bitmap;
use crate::surface::{ShapeStyle, ShapedText, StrokeStyle, Surface};
use kurbo::{Affine, BezPath, Line, Rect, RoundedRect, Shape};
use peniko::{Blob, Color, Fill, Format, Image, Mix};
use vello::Scene;

struct Level {
    transform: Affine,
    layers: usize,
}

pub struct VelloSurface<'s> {
    scene: &'s mut Scene,
    transform: Affine,
    layers: usize,
    stack: Vec<Level>,
    base_color: Color,
}

impl<'s> VelloSurface<'s> {
    pub fn new(scene: &'s mut Scene) -> Self {
        Self {
            scene,
            transform: Affine::IDENTITY,
            layers: 0,
            stack: Vec::new(),
            base_color: Color::TRANSPARENT,
        }
    }

    /// Color from the last `clear`, for `vello::RenderParams::base_color`.
    pub fn base_color(&self) -> Color {
        self.base_color
    }

    fn fill_and_stroke(&mut self, shape: &impl Shape, style: &ShapeStyle) {
        self.scene
            .fill(Fill::NonZero, self.transform, style.fill, None, shape);
        if let Some(stroke) = &style.stroke {
            self.scene
                .stroke(&stroke.stroke, self.transform, stroke.color, None, shape);
        }
    }
}

impl Surface for VelloSurface<'_> {
    fn clear(&mut self, color: Color) {
        self.scene.reset();
        self.stack.clear();
        self.layers = 0;
        self.transform = Affine::IDENTITY;
        self.base_color = color;
    }

    fn save(&mut self) {
        self.stack.push(Level {
            transform: self.transform,
            layers: self.layers,
        });
        self.layers = 0;
    }

    fn restore(&mut self) {
        for _ in 0..self.layers {
            self.scene.pop_layer();
        }
        if let Some(level) = self.stack.pop() {
            self.transform = level.transform;
            self.layers = level.layers;
        } else {
            self.layers = 0;
        }
    }

    fn concat(&mut self, transform: Affine) {
        self.transform = self.transform * transform;
    }

    fn clip(&mut self, shape: &BezPath) {
        self.scene.push_layer(Mix::Clip, 1.0, self.transform, shape);
        self.layers += 1;
    }

    fn draw_rect(&mut self, rect: RoundedRect, style: &ShapeStyle) {
        self.fill_and_stroke(&rect, style);
    }

    fn draw_oval(&mut self, bounds: Rect, style: &ShapeStyle) {
        self.fill_and_stroke(&kurbo::Ellipse::from_rect(bounds), style);
    }

    fn draw_line(&mut self, line: Line, stroke: &StrokeStyle) {
        self.scene
            .stroke(&stroke.stroke, self.transform, stroke.color, None, &line);
    }

    fn draw_path(&mut self, path: &BezPath, style: &ShapeStyle) {
        self.fill_and_stroke(path, style);
    }

    fn draw_text(&mut self, text: &ShapedText, color: Color) {
        let Some(font) = &text.font else {
            log::trace!("no font data for {:?}, skipping", text.text);
            return;
        };
        let transform = self.transform * Affine::translate(text.origin.to_vec2());
        self.scene
            .draw_glyphs(font)
            .font_size(text.font_size)
            .transform(transform)
            .brush(color)
            .draw(
                Fill::NonZero,
                text.glyphs.iter().map(|g| vello::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }),
            );
    }

    fn draw_image(&mut self, image: &Bitmap, src: Rect, dst: Rect, opacity: f32) {
        if src.width() <= 0.0 || src.height() <= 0.0 || dst.width() <= 0.0 || dst.height() <= 0.0 {
            return;
        }
        let data = Blob::from(image.pixels.as_ref().clone());
        let img = Image::new(data, Format::Rgba8, image.width, image.height).with_alpha(opacity);
        // Map the source rect of the bitmap onto the destination rect.
        let placement = Affine::translate(dst.origin().to_vec2())
            * Affine::scale_non_uniform(dst.width() / src.width(), dst.height() / src.height())
            * Affine::translate(-src.origin().to_vec2());
        self.scene.push_layer(Mix::Clip, 1.0, self.transform, &dst);
        self.scene.draw_image(&img, self.transform * placement);
        self.scene.pop_layer();
    }
}
