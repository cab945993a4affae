//! Text metrics are supplied by the host. The pipeline never assumes a font
//! is available synchronously: it asks [`FontProvider::is_ready`] first and
//! skips the run until the host reports the family loaded.

use crate::surface::{PositionedGlyph, ShapedText};
use kurbo::{Point, Size};

/// A single styled text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font_family: &'a str,
    pub font_size: f32,
    pub font_weight: u16,
}

pub trait FontProvider {
    fn is_ready(&self, family: &str) -> bool;
    /// Laid-out size of the run, wrapping at `max_width` when given.
    fn measure(&self, run: &TextRun<'_>, max_width: Option<f32>) -> Size;
    fn shape(&self, run: &TextRun<'_>, max_width: Option<f32>) -> ShapedText;
}

/// Monospace-ish estimate: every character advances half the font size,
/// lines are `1.25 × size` tall. Always ready. Good enough for headless layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

const ADVANCE: f32 = 0.5;
const LINE_HEIGHT: f32 = 1.25;

impl ApproximateMetrics {
    fn lines<'t>(run: &TextRun<'t>, max_width: Option<f32>) -> Vec<&'t str> {
        let advance = run.font_size * ADVANCE;
        let per_line = max_width
            .filter(|w| *w > 0.0 && advance > 0.0)
            .map(|w| ((w / advance).floor() as usize).max(1));
        let mut out = Vec::new();
        for line in run.text.split('\n') {
            match per_line {
                Some(n) if line.chars().count() > n => {
                    let mut rest = line;
                    while !rest.is_empty() {
                        let cut = rest
                            .char_indices()
                            .nth(n)
                            .map_or(rest.len(), |(i, _)| i);
                        out.push(&rest[..cut]);
                        rest = &rest[cut..];
                    }
                }
                _ => out.push(line),
            }
        }
        out
    }
}

impl FontProvider for ApproximateMetrics {
    fn is_ready(&self, _family: &str) -> bool {
        true
    }

    fn measure(&self, run: &TextRun<'_>, max_width: Option<f32>) -> Size {
        let lines = Self::lines(run, max_width);
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Size::new(
            (widest as f32 * run.font_size * ADVANCE) as f64,
            (lines.len() as f32 * run.font_size * LINE_HEIGHT) as f64,
        )
    }

    fn shape(&self, run: &TextRun<'_>, max_width: Option<f32>) -> ShapedText {
        let advance = run.font_size * ADVANCE;
        let line_height = run.font_size * LINE_HEIGHT;
        let mut glyphs = Vec::new();
        for (row, line) in Self::lines(run, max_width).iter().enumerate() {
            let baseline = row as f32 * line_height + run.font_size;
            for (col, c) in line.chars().enumerate() {
                glyphs.push(PositionedGlyph {
                    id: c as u32,
                    x: col as f32 * advance,
                    y: baseline,
                });
            }
        }
        ShapedText {
            text: run.text.to_string(),
            origin: Point::ZERO,
            size: self.measure(run, max_width),
            font_size: run.font_size,
            glyphs,
            font: None,
        }
    }
}
