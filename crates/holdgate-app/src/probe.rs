//! Target reachability and wake-up.

use std::{future::Future, time::Duration};

use holdgate_core::MacAddress;
use thiserror::Error;

/// Failure to emit a magic packet. Never fatal to the gate.
#[derive(Error, Debug)]
pub enum WakeError {
    /// Socket creation, broadcast option or send failed
    #[error("wake packet not sent: {0}")]
    Io(#[from] std::io::Error),

    /// Datagram went out truncated
    #[error("short send: {sent} of {expected} bytes")]
    ShortSend {
        /// Bytes actually sent
        sent: usize,
        /// Magic packet length
        expected: usize,
    },
}

/// Network side of the liveness strategy.
///
/// # Implementations
///
/// - **Production**: TCP connect probe and UDP broadcast
/// - **Simulation**: scripted reachability with call counters
pub trait Prober: Send + Sync {
    /// Whether `host:port` accepts a TCP connection within `timeout`.
    ///
    /// Every failure cause (resolution, socket, refusal, timeout) collapses to
    /// `false`.
    fn is_reachable(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send;

    /// Broadcast one magic packet for `mac`.
    ///
    /// # Errors
    ///
    /// Returns a [`WakeError`] if the packet could not be sent.
    fn wake(&self, mac: MacAddress) -> impl Future<Output = Result<(), WakeError>> + Send;
}

impl<P: Prober> Prober for &P {
    fn is_reachable(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send {
        (**self).is_reachable(host, port, timeout)
    }

    fn wake(&self, mac: MacAddress) -> impl Future<Output = Result<(), WakeError>> + Send {
        (**self).wake(mac)
    }
}
