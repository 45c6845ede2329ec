//! Application layer for Holdgate
//!
//! Generic runtime that executes [`holdgate_core::Gate`] actions against a
//! session host, enabling deterministic simulation testing with the same code
//! that runs in production.
//!
//! # Components
//!
//! - [`GateRuntime`]: Orchestration loop for one held session
//! - [`SessionHost`]: Trait for the proxy's session (disconnect flag, display)
//! - [`Prober`]: Trait for reachability probes and wake packets
//! - [`key_channel`]: Handoff of key events from the host's dispatch context

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod host;
mod keys;
mod probe;
mod runtime;

pub use host::{HostError, SessionHost};
pub use keys::{KeyPress, KeyReceiver, KeySender, key_channel};
pub use probe::{Prober, WakeError};
pub use runtime::{DISCONNECT_CHECK_INTERVAL, GateRuntime};
