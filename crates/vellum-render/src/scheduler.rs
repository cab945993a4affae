//! Coalesced frame scheduling.
//!
//! Any number of `schedule()` calls between two frames produce exactly one
//! host repaint request. The flag is cleared when the paint pass begins, so
//! a change that lands mid-paint schedules the next frame.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Host hook that arranges for `Renderer::render_frame` to run soon
/// (e.g. `requestAnimationFrame`, a winit redraw request).
pub trait FrameRequester: Send + Sync {
    fn request_frame(&self);
}

impl<F: Fn() + Send + Sync> FrameRequester for F {
    fn request_frame(&self) {
        self()
    }
}

/// Cloneable handle; every clone shares one "scheduled" flag.
#[derive(Clone)]
pub struct FrameScheduler {
    scheduled: Arc<AtomicBool>,
    requester: Arc<dyn FrameRequester>,
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("scheduled", &self.is_scheduled())
            .finish_non_exhaustive()
    }
}

impl FrameScheduler {
    pub fn new(requester: Arc<dyn FrameRequester>) -> Self {
        Self {
            scheduled: Arc::new(AtomicBool::new(false)),
            requester,
        }
    }

    /// Request a frame unless one is already pending. Returns whether the
    /// host was asked.
    pub fn schedule(&self) -> bool {
        if self.scheduled.swap(true, Ordering::AcqRel) {
            return false;
        }
        log::trace!("frame requested");
        self.requester.request_frame();
        true
    }

    /// Mark the pending frame as started.
    pub fn begin_frame(&self) {
        self.scheduled.store(false, Ordering::Release);
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }
}
