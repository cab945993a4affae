//! Image cache with deduplicated asynchronous fetches.
//!
//! Each source moves through `Pending → Ready | Failed`. The first request
//! for a source starts exactly one fetch through the host's
//! [`ImageFetcher`]; later requests see `Pending` until the completion
//! arrives. Completions travel over an unbounded channel and are applied in
//! [`ImageCache::drain`] at the start of a frame, so the cache is only ever
//! touched from the render thread.
//!
//! Eviction never cancels an in-flight fetch. An unreferenced `Pending`
//! slot is parked as orphaned: a later request re-attaches to it, and its
//! completion is dropped on arrival only if nothing re-attached.

use crate::scheduler::FrameScheduler;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// A decoded RGBA8 (straight alpha) image.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width, self.height)
    }
}

impl Bitmap {
    /// Decode PNG / JPEG / WebP / GIF bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: Arc::new(rgba.into_raw()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    #[error("fetching {src} failed: {reason}")]
    Fetch { src: String, reason: String },
    #[error("decoding {src} failed: {reason}")]
    Decode { src: String, reason: String },
}

/// Host-provided loader. `fetch` must return promptly; the bytes are handed
/// back later, from any thread, through [`FetchCompletion::complete`].
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, src: &str, completion: FetchCompletion);
}

struct FetchResult {
    src: String,
    bytes: Result<Vec<u8>, String>,
}

/// One-shot completion handle for a single fetch.
pub struct FetchCompletion {
    src: String,
    tx: UnboundedSender<FetchResult>,
    scheduler: FrameScheduler,
}

impl fmt::Debug for FetchCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCompletion")
            .field("src", &self.src)
            .finish_non_exhaustive()
    }
}

impl FetchCompletion {
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Hand back the fetched bytes (or a failure reason) and request a
    /// repaint. Safe to call after the renderer is gone.
    pub fn complete(self, bytes: Result<Vec<u8>, String>) {
        let delivered = self
            .tx
            .send(FetchResult {
                src: self.src,
                bytes,
            })
            .is_ok();
        if delivered {
            self.scheduler.schedule();
        }
    }
}

/// What a lookup found.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageLookup {
    Ready(Arc<Bitmap>),
    Pending,
    Failed(AssetLoadError),
}

enum Slot {
    Pending,
    Ready(Arc<Bitmap>),
    Failed(AssetLoadError),
}

impl Slot {
    fn lookup(&self) -> ImageLookup {
        match self {
            Slot::Pending => ImageLookup::Pending,
            Slot::Ready(bitmap) => ImageLookup::Ready(Arc::clone(bitmap)),
            Slot::Failed(err) => ImageLookup::Failed(err.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub failures: u64,
}

pub struct ImageCache {
    slots: HashMap<String, Slot>,
    fetcher: Arc<dyn ImageFetcher>,
    scheduler: FrameScheduler,
    tx: UnboundedSender<FetchResult>,
    rx: UnboundedReceiver<FetchResult>,
    /// Pending sources evicted while their fetch was in flight.
    orphaned: HashSet<String>,
    stats: CacheStats,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.slots.len())
            .field("orphaned", &self.orphaned.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ImageCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, scheduler: FrameScheduler) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            slots: HashMap::new(),
            fetcher,
            scheduler,
            tx,
            rx,
            orphaned: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// Look up `src`, starting a fetch on the first miss. An orphaned
    /// in-flight source is re-attached instead of fetched again.
    pub fn request(&mut self, src: &str) -> ImageLookup {
        if self.orphaned.remove(src) {
            log::trace!("re-attached in-flight image {src}");
        }
        if let Some(slot) = self.slots.get(src) {
            self.stats.hits += 1;
            return slot.lookup();
        }
        self.stats.misses += 1;
        self.start_fetch(src);
        ImageLookup::Pending
    }

    /// Look up without side effects.
    pub fn status(&self, src: &str) -> Option<ImageLookup> {
        self.slots.get(src).map(Slot::lookup)
    }

    fn start_fetch(&mut self, src: &str) {
        self.slots.insert(src.to_string(), Slot::Pending);
        self.stats.fetches += 1;
        log::debug!("fetching image {src}");
        self.fetcher.fetch(
            src,
            FetchCompletion {
                src: src.to_string(),
                tx: self.tx.clone(),
                scheduler: self.scheduler.clone(),
            },
        );
    }

    /// Apply every completion that has arrived. Returns how many slots
    /// changed state.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(FetchResult { src, bytes }) = self.rx.try_recv() {
            if !matches!(self.slots.get(&src), Some(Slot::Pending)) {
                log::trace!("dropping late image {src}");
                continue;
            }
            if self.orphaned.remove(&src) {
                log::trace!("dropping unreferenced image {src}");
                self.slots.remove(&src);
                continue;
            }
            let slot = match bytes {
                Err(reason) => Slot::Failed(AssetLoadError::Fetch {
                    src: src.clone(),
                    reason,
                }),
                Ok(bytes) => match Bitmap::decode(&bytes) {
                    Ok(bitmap) => {
                        log::debug!("image {src} ready ({}x{})", bitmap.width, bitmap.height);
                        Slot::Ready(Arc::new(bitmap))
                    }
                    Err(err) => Slot::Failed(AssetLoadError::Decode {
                        src: src.clone(),
                        reason: err.to_string(),
                    }),
                },
            };
            if let Slot::Failed(err) = &slot {
                log::warn!("{err}");
                self.stats.failures += 1;
            }
            self.slots.insert(src, slot);
            applied += 1;
        }
        applied
    }

    /// Re-arm a failed source so the next request fetches it again.
    /// Returns false when the source is not in the failed state.
    pub fn retry(&mut self, src: &str) -> bool {
        if matches!(self.slots.get(src), Some(Slot::Failed(_))) {
            self.slots.remove(src);
            self.scheduler.schedule();
            true
        } else {
            false
        }
    }

    /// Evict every settled entry not in `referenced`. Unreferenced pending
    /// entries stay in flight as orphans until they land or are requested.
    pub fn retain_referenced(&mut self, referenced: &HashSet<String>) {
        let before = self.slots.len();
        let orphaned = &mut self.orphaned;
        self.slots.retain(|src, slot| {
            if referenced.contains(src) {
                orphaned.remove(src);
                return true;
            }
            match slot {
                Slot::Pending => {
                    orphaned.insert(src.clone());
                    true
                }
                Slot::Ready(_) | Slot::Failed(_) => false,
            }
        });
        let evicted = before - self.slots.len();
        if evicted > 0 {
            log::debug!("evicted {evicted} unreferenced image(s)");
        }
    }

    /// Sources with a fetch still outstanding, orphaned ones included.
    pub fn in_flight(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
