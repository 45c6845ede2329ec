//! Error types for the holdgate core.
//!
//! Strongly-typed errors for the three places the core can refuse work:
//! building a gate configuration, driving the gate state machine out of order,
//! and allocating a frame for the status screen.
//!
//! A wrong passcode, an unreachable target or a client that hangs up are not
//! errors. They are ordinary gate outcomes (see [`crate::GateOutcome`]).

use thiserror::Error;

use crate::gate::GateState;

/// Errors raised while assembling a [`crate::GateConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// MAC address not in `AA:BB:CC:DD:EE:FF` form
    #[error("invalid MAC address: {0:?}")]
    InvalidMac(String),

    /// Shared secret contains a character outside the base32 alphabet
    #[error("invalid base32 character {found:?} at position {position}")]
    InvalidBase32 {
        /// Offending character
        found: char,
        /// Byte offset in the input
        position: usize,
    },

    /// Shared secret decodes to zero bytes
    #[error("shared secret is empty")]
    EmptySecret,

    /// Target port 0 cannot be probed
    #[error("target port must be in 1..=65535")]
    ZeroPort,

    /// A duration knob that must be positive was zero
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending setting
        field: &'static str,
    },

    /// Tolerance window so wide that checking one code would stall the gate
    #[error("totp.window {window} exceeds the maximum of {max} steps")]
    WindowTooLarge {
        /// Requested window in steps
        window: u32,
        /// Largest accepted window
        max: u32,
    },

    /// An attempt limit of zero would deny before the first submission
    #[error("totp.max_attempts must be greater than zero")]
    ZeroAttempts,

    /// Screen dimensions were zero
    #[error("screen size must be non-zero, got {width}x{height}")]
    EmptyScreen {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
}

/// Errors from driving the [`crate::Gate`] state machine out of order.
///
/// These indicate a driver bug, never a remote-side failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Operation not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the error occurred
        state: GateState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Event does not belong to the gate's signal source
    #[error("unexpected {event} event for {strategy} gate")]
    UnexpectedEvent {
        /// Event that was delivered
        event: &'static str,
        /// Strategy the gate runs
        strategy: &'static str,
    },
}

/// Errors from the status-rendering pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Frame buffer could not be allocated
    #[error("failed to allocate {bytes} byte frame buffer")]
    Allocation {
        /// Requested size
        bytes: usize,
    },

    /// Frame dimensions overflow the address space
    #[error("frame size {width}x{height} overflows")]
    Oversized {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidMac("00:11".to_string());
        assert_eq!(err.to_string(), "invalid MAC address: \"00:11\"");

        let err = ConfigError::ZeroDuration { field: "wol.interval" };
        assert_eq!(err.to_string(), "wol.interval must be greater than zero");

        let err = ConfigError::InvalidBase32 { found: '1', position: 3 };
        assert_eq!(err.to_string(), "invalid base32 character '1' at position 3");
    }

    #[test]
    fn gate_error_display() {
        let err = GateError::InvalidState { state: GateState::Init, operation: "handle" };
        assert_eq!(err.to_string(), "invalid state transition: cannot handle from Init");

        let err = GateError::UnexpectedEvent { event: "key", strategy: "liveness" };
        assert_eq!(err.to_string(), "unexpected key event for liveness gate");
    }
}
