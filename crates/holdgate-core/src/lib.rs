//! Holdgate core
//!
//! Pure admission logic for holding a remote-desktop session at the proxy
//! until an external signal arrives. Nothing in this crate performs I/O:
//! the [`Gate`] state machine takes time and events as input and returns
//! [`GateAction`]s that a driver executes.
//!
//! # Components
//!
//! - [`Gate`]: Admission state machine for both strategies
//! - [`CodeCollector`]: Scan-code to passcode buffer
//! - [`totp`]: RFC 6238 passcode validation
//! - [`raster`]: Status text rasterization into a BGRA frame
//! - [`wol`]: Wake-on-LAN magic packet
//! - [`env::Environment`]: Time abstraction for deterministic tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod collector;
mod config;
pub mod env;
mod error;
mod gate;
pub mod raster;
pub mod totp;
pub mod wol;

pub use collector::{
    CodeCollector, CollectorEvent, KBD_FLAGS_RELEASE, KeyClass, SCAN_BACKSPACE, SCAN_DIGITS,
    SCAN_ENTER,
};
pub use config::{
    DEFAULT_OVERALL_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH, DEFAULT_TARGET_HOST, DEFAULT_TARGET_PORT, DEFAULT_TOLERANCE_WINDOW,
    GateConfig, LivenessConfig, MAX_TOLERANCE_WINDOW, MacAddress, PasscodeConfig, ScreenSize,
};
pub use error::{ConfigError, GateError, RenderError};
pub use gate::{Gate, GateAction, GateEvent, GateOutcome, GateState, Strategy};
pub use raster::{FrameBuffer, Glyph, GlyphSource, SurfaceBitmap, render_text};
pub use totp::SharedSecret;
