//! Session host that records what the gate did to it.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use holdgate_app::{HostError, SessionHost};
use holdgate_core::SurfaceBitmap;

/// Frame as the host received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    /// Bitmap width
    pub width: u32,
    /// Bitmap height
    pub height: u32,
    /// Copy of the BGRA bytes
    pub data: Vec<u8>,
}

impl RecordedFrame {
    /// Number of pixels with non-zero coverage.
    pub fn lit_pixels(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[0] != 0).count()
    }
}

#[derive(Debug, Default)]
struct Shared {
    frames: Mutex<Vec<RecordedFrame>>,
    checks: AtomicU32,
    disconnected: AtomicBool,
    reject_frames: AtomicBool,
}

/// [`SessionHost`] that records frames and disconnect checks.
///
/// Clones share state. The client can be made to leave immediately, after a
/// number of disconnect checks, or at any time via [`RecordingHost::disconnect`].
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    shared: Arc<Shared>,
    disconnect_after: Option<u32>,
}

impl RecordingHost {
    /// Host whose client stays connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose client is gone once `checks` disconnect checks have been
    /// answered with "still here".
    pub fn disconnecting_after(checks: u32) -> Self {
        Self { disconnect_after: Some(checks), ..Self::default() }
    }

    /// Make every frame submission fail.
    #[must_use]
    pub fn rejecting_frames(self) -> Self {
        self.shared.reject_frames.store(true, Ordering::SeqCst);
        self
    }

    /// Mark the client as gone.
    pub fn disconnect(&self) {
        self.shared.disconnected.store(true, Ordering::SeqCst);
    }

    /// Frames received so far.
    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.shared.frames.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of frames received so far.
    pub fn frame_count(&self) -> usize {
        self.shared.frames.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of disconnect checks answered so far.
    pub fn checks(&self) -> u32 {
        self.shared.checks.load(Ordering::SeqCst)
    }
}

impl SessionHost for RecordingHost {
    fn shall_disconnect(&self) -> bool {
        let seen = self.shared.checks.fetch_add(1, Ordering::SeqCst);
        if self.disconnect_after.is_some_and(|limit| seen >= limit) {
            self.shared.disconnected.store(true, Ordering::SeqCst);
        }
        self.shared.disconnected.load(Ordering::SeqCst)
    }

    fn submit_frame(&self, bitmap: &SurfaceBitmap<'_>) -> Result<(), HostError> {
        if self.shared.reject_frames.load(Ordering::SeqCst) {
            return Err(HostError::SurfaceUnavailable);
        }
        let frame =
            RecordedFrame { width: bitmap.width, height: bitmap.height, data: bitmap.data.to_vec() };
        self.shared.frames.lock().unwrap_or_else(PoisonError::into_inner).push(frame);
        Ok(())
    }
}
