//! Environment abstraction for deterministic testing.
//!
//! Decouples gate logic from system resources (monotonic time, wall-clock
//! time, sleeping). Production uses the real clocks; the simulation harness
//! substitutes a virtual clock so that poll/timeout behavior can be tested
//! without real sleeps.

use std::{future::Future, ops::Sub, time::Duration};

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `sleep(d)` returns only once `now()` has advanced by at least `d`
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use a virtual offset from the start of the run.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Seconds since the Unix epoch.
    ///
    /// Only the passcode validator consumes wall-clock time; everything that
    /// measures elapsed time uses [`Environment::now`].
    fn unix_time(&self) -> u64;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not gate logic).
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
