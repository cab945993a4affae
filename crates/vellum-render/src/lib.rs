//! Retained-mode rendering for Vellum documents.
//!
//! The pipeline reads a [`vellum_core::Document`] and paints one scene onto
//! a host [`Surface`]. Images and fonts arrive asynchronously from the host;
//! the pipeline never blocks on them and schedules a repaint when they land.

pub mod assets;
pub mod config;
pub mod fonts;
pub mod geometry;
pub mod hit;
pub mod paint;
pub mod pipeline;
pub mod scheduler;
pub mod surface;
#[cfg(feature = "vello")]
pub mod vello_surface;

pub use assets::{
    AssetLoadError, Bitmap, CacheStats, FetchCompletion, ImageCache, ImageFetcher, ImageLookup,
};
pub use config::RenderConfig;
pub use fonts::{ApproximateMetrics, FontProvider, TextRun};
pub use geometry::{NodeGeometry, SceneGeometry, fit_rects};
pub use hit::{hit_test, hit_test_rect};
pub use paint::{FrameStats, paint_to_color};
pub use pipeline::Renderer;
pub use scheduler::{FrameRequester, FrameScheduler};
pub use surface::{
    DisplayList, DrawOp, PositionedGlyph, ShapeStyle, ShapedText, StrokeStyle, Surface,
};
#[cfg(feature = "vello")]
pub use vello_surface::VelloSurface;
