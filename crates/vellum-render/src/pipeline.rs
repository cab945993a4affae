//! The frame loop.
//!
//! A host owns one [`Renderer`] per canvas. Document changes and asset
//! arrivals call [`Renderer::invalidate`] (or go through the shared
//! [`FrameScheduler`]); the host answers the resulting frame request by
//! calling [`Renderer::render_frame`] with its surface.

use crate::assets::{ImageCache, ImageFetcher};
use crate::config::RenderConfig;
use crate::fonts::FontProvider;
use crate::geometry::SceneGeometry;
use crate::hit;
use crate::paint::{FrameStats, PaintContext, paint_scene};
use crate::scheduler::{FrameRequester, FrameScheduler};
use crate::surface::Surface;
use kurbo::{Point, Rect};
use peniko::Color;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use vellum_core::{Document, NodeId};

pub struct Renderer {
    config: RenderConfig,
    images: ImageCache,
    fonts: Box<dyn FontProvider>,
    scheduler: FrameScheduler,
    pending_fonts: HashSet<String>,
    last_geometry: SceneGeometry,
    last_stats: FrameStats,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("images", &self.images)
            .field("scheduler", &self.scheduler)
            .field("pending_fonts", &self.pending_fonts)
            .field("last_stats", &self.last_stats)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(
        config: RenderConfig,
        fetcher: Arc<dyn ImageFetcher>,
        fonts: Box<dyn FontProvider>,
        requester: Arc<dyn FrameRequester>,
    ) -> Self {
        let scheduler = FrameScheduler::new(requester);
        Self {
            images: ImageCache::new(fetcher, scheduler.clone()),
            config,
            fonts,
            scheduler,
            pending_fonts: HashSet::new(),
            last_geometry: SceneGeometry::default(),
            last_stats: FrameStats::default(),
        }
    }

    /// Ask the host for a frame. Coalesced with any request already pending.
    pub fn invalidate(&self) -> bool {
        self.scheduler.schedule()
    }

    /// Paint `scene_id` of `doc` onto `surface`.
    pub fn render_frame(
        &mut self,
        surface: &mut dyn Surface,
        doc: &Document,
        scene_id: NodeId,
    ) -> FrameStats {
        self.scheduler.begin_frame();
        let arrived = self.images.drain();
        if arrived > 0 {
            log::trace!("{arrived} image(s) arrived since last frame");
        }

        let geometry = SceneGeometry::resolve(doc, scene_id, self.fonts.as_ref());
        let background = doc
            .scene(scene_id)
            .and_then(|s| s.background_color)
            .unwrap_or(self.config.background);
        surface.clear(Color::new([background.r, background.g, background.b, background.a]));

        let mut cx = PaintContext::new(surface, &mut self.images, self.fonts.as_ref());
        paint_scene(&mut cx, doc, &geometry, scene_id);
        let PaintContext {
            stats,
            referenced,
            pending_fonts,
            ..
        } = cx;

        if self.config.evict_unreferenced || self.images.len() > self.config.max_cached_images {
            self.images.retain_referenced(&referenced);
        }
        self.pending_fonts = pending_fonts;
        self.last_geometry = geometry;
        self.last_stats = stats;
        log::debug!(
            "frame {scene_id}: {} painted, {} image(s) pending, {} text run(s) waiting",
            stats.nodes_painted,
            stats.images_pending,
            stats.text_pending
        );
        stats
    }

    /// The host's font provider finished loading `family`. Schedules a
    /// repaint when the last frame skipped text in that family.
    pub fn on_font_ready(&mut self, family: &str) -> bool {
        if self.pending_fonts.remove(family) {
            log::debug!("font {family} ready, repainting");
            self.scheduler.schedule();
            true
        } else {
            false
        }
    }

    /// Re-arm a failed image; the next frame fetches it again.
    pub fn retry_image(&mut self, src: &str) -> bool {
        self.images.retry(src)
    }

    /// Topmost node under `point` as of the last frame.
    pub fn hit_test(&self, doc: &Document, point: Point) -> Option<NodeId> {
        hit::hit_test(doc, &self.last_geometry, point)
    }

    /// Nodes intersecting `marquee` as of the last frame.
    pub fn hit_test_rect(&self, doc: &Document, marquee: Rect) -> Vec<NodeId> {
        hit::hit_test_rect(doc, &self.last_geometry, marquee)
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.last_geometry
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Shared handle for anything outside the renderer that needs to
    /// request a repaint.
    pub fn scheduler(&self) -> FrameScheduler {
        self.scheduler.clone()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}
