//! Scripted reachability for liveness scenarios.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use holdgate_app::{Prober, WakeError};
use holdgate_core::MacAddress;

/// When the scripted target starts answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// First probe already succeeds
    Always,
    /// Probes fail until `n` have been made; probe `n + 1` succeeds
    AfterProbes(u32),
    /// Every probe fails
    Never,
}

#[derive(Debug, Default)]
struct Counters {
    probes: AtomicU32,
    wakes: AtomicU32,
    fail_wake: AtomicBool,
}

/// [`Prober`] that follows a [`Reachability`] script and counts calls.
///
/// Clones share counters.
#[derive(Debug, Clone)]
pub struct ScriptedProber {
    script: Reachability,
    counters: Arc<Counters>,
}

impl ScriptedProber {
    /// Prober following `script`.
    pub fn new(script: Reachability) -> Self {
        Self { script, counters: Arc::default() }
    }

    /// Make every wake call fail with an I/O error.
    #[must_use]
    pub fn failing_wake(self) -> Self {
        self.counters.fail_wake.store(true, Ordering::SeqCst);
        self
    }

    /// Probes made so far.
    pub fn probes(&self) -> u32 {
        self.counters.probes.load(Ordering::SeqCst)
    }

    /// Wake calls made so far, including failed ones.
    pub fn wakes(&self) -> u32 {
        self.counters.wakes.load(Ordering::SeqCst)
    }
}

impl Prober for ScriptedProber {
    fn is_reachable(
        &self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> impl Future<Output = bool> + Send {
        let made = self.counters.probes.fetch_add(1, Ordering::SeqCst);
        let reachable = match self.script {
            Reachability::Always => true,
            Reachability::AfterProbes(n) => made >= n,
            Reachability::Never => false,
        };
        tracing::trace!(host, port, probe = made + 1, reachable, "scripted probe");
        std::future::ready(reachable)
    }

    fn wake(&self, mac: MacAddress) -> impl Future<Output = Result<(), WakeError>> + Send {
        self.counters.wakes.fetch_add(1, Ordering::SeqCst);
        let result = if self.counters.fail_wake.load(Ordering::SeqCst) {
            Err(WakeError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        } else {
            tracing::trace!(%mac, "scripted wake");
            Ok(())
        };
        std::future::ready(result)
    }
}
