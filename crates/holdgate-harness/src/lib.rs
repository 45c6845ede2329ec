//! Deterministic simulation harness for Holdgate.
//!
//! In-memory implementations of the runtime's seams so that complete gate
//! runs can be tested without sockets, fonts or real sleeps.
//!
//! - [`SimEnv`]: virtual clock that advances only when the gate sleeps
//! - [`ScriptedProber`]: target that comes up after a scripted number of probes
//! - [`RecordingHost`]: host that records frames and can disconnect on cue
//! - [`BlockGlyphs`]: glyph source that draws solid blocks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block_glyphs;
pub mod recording_host;
pub mod scripted_prober;
pub mod sim_env;

pub use block_glyphs::BlockGlyphs;
pub use recording_host::{RecordedFrame, RecordingHost};
pub use scripted_prober::{Reachability, ScriptedProber};
pub use sim_env::SimEnv;
