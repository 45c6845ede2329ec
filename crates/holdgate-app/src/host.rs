//! Session host abstraction.
//!
//! The [`SessionHost`] trait is the gate's view of the proxy that owns the
//! held session: it can be asked whether the client is gone and it accepts
//! full-frame status bitmaps. Production adapts the proxy's session context;
//! the simulation harness records calls instead.

use holdgate_core::SurfaceBitmap;
use thiserror::Error;

/// Errors a host reports when a frame cannot be shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Display surface is not available (yet or anymore)
    #[error("display surface unavailable")]
    SurfaceUnavailable,

    /// Host rejected the bitmap
    #[error("frame rejected: {0}")]
    Rejected(String),
}

/// Proxy-side session the gate is holding.
///
/// Both methods are called from the gate's own task; implementations must be
/// cheap and must not block on the client.
pub trait SessionHost: Send + Sync {
    /// Whether the client connection has gone away.
    fn shall_disconnect(&self) -> bool;

    /// Show a full-frame status bitmap to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot display the frame. The gate logs it
    /// and carries on without visual feedback for that frame.
    fn submit_frame(&self, bitmap: &SurfaceBitmap<'_>) -> Result<(), HostError>;
}

impl<H: SessionHost + ?Sized> SessionHost for &H {
    fn shall_disconnect(&self) -> bool {
        (**self).shall_disconnect()
    }

    fn submit_frame(&self, bitmap: &SurfaceBitmap<'_>) -> Result<(), HostError> {
        (**self).submit_frame(bitmap)
    }
}
