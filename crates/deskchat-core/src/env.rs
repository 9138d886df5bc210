//! Environment abstraction for deterministic testing.
//!
//! Decouples client logic from the system clock. Production uses real
//! monotonic time; tests use a manually advanced clock so reconnect delays can
//! be checked without waiting.

use std::time::Duration;

/// Abstract environment providing time and async sleep.
///
/// # Invariants
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; tests may use any
    /// monotonic representation.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines take `now` as a parameter
    /// instead.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
