//! Virtual-clock environment.
//!
//! Time only moves when the gate sleeps. A sleep, once polled, advances the
//! clock by exactly the requested duration and then yields once, so other
//! tasks on the same runtime (a scripted typist, for instance) get to run
//! between polls.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use holdgate_core::env::Environment;

/// Deterministic [`Environment`] with a shared virtual clock.
///
/// Clones share the clock, so a test can keep one handle and hand another to
/// the runtime.
#[derive(Debug, Clone)]
pub struct SimEnv {
    clock: Arc<Mutex<Duration>>,
    epoch: u64,
}

impl SimEnv {
    /// Clock at zero with the wall clock pinned to `epoch` seconds.
    pub fn new(epoch: u64) -> Self {
        Self { clock: Arc::new(Mutex::new(Duration::ZERO)), epoch }
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward without sleeping.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock += by;
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }

    fn unix_time(&self) -> u64 {
        self.epoch + self.elapsed().as_secs()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let env = self.clone();
        async move {
            env.advance(duration);
            tokio::task::yield_now().await;
        }
    }
}
