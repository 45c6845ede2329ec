//! Holdgate production glue.
//!
//! Wraps the action-based [`holdgate_core::Gate`] and the generic
//! [`holdgate_app::GateRuntime`] with real I/O: system clocks, TCP/UDP
//! sockets, a font file for the status screen and a TOML settings file.
//!
//! # Components
//!
//! - [`SessionGate`]: Blocking session-start hook for proxy integrations
//! - [`NetProber`]: TCP connect probe and Wake-on-LAN broadcast
//! - [`FontGlyphs`]: Glyph source backed by a scalable font
//! - [`Settings`]: TOML settings with documented defaults
//! - [`SystemEnv`]: Production environment (real time)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod font;
mod probe;
mod session;
pub mod settings;
mod system_env;

pub use error::{FontError, ServerError, SettingsError};
pub use font::FontGlyphs;
pub use probe::{NetProber, WOL_BROADCAST};
pub use session::SessionGate;
pub use settings::Settings;
pub use system_env::SystemEnv;
