use serde::{Deserialize, Serialize};
use vellum_core::Color;

/// Renderer settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear color for scenes without a `background_color`.
    pub background: Color,
    /// Soft cap on decoded images kept in the cache.
    pub max_cached_images: usize,
    /// Drop cache entries the last frame did not reference.
    pub evict_unreferenced: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            max_cached_images: 256,
            evict_unreferenced: true,
        }
    }
}
