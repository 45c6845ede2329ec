//! Production Environment implementation using the system clocks.
//!
//! `SystemEnv` reads `std::time::Instant` for elapsed time, the system
//! wall clock for passcode validation, and sleeps on the Tokio timer.

use std::time::Duration;

use holdgate_core::env::Environment;

/// Production environment backed by the operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    // A clock set before 1970 yields 0, which matches no plausible passcode.
    #[allow(clippy::disallowed_methods)]
    fn unix_time(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |since| since.as_secs())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
