//! Rate gate that keeps a repeated diagnostic from flooding the logs.
//!
//! Both failure classes in the pipeline — buffer overflow on the enqueue
//! path and transport failure on the dispatch path — can fire thousands of
//! times per second under sustained trouble. Each path holds its own gate so
//! one class never suppresses the other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Gag period applied when none is configured: five minutes.
pub const DEFAULT_GAG_PERIOD: Duration = Duration::from_secs(300);

/// Sentinel for "nothing emitted yet".
const NEVER: u64 = u64::MAX;

/// Decides whether a repeated diagnostic may be emitted now.
///
/// A message is allowed iff more than the gag period has passed since the
/// last allowed one. The timestamp is advanced with a single
/// compare-exchange, so under a concurrent race at the period boundary
/// exactly one caller wins; losers are suppressed. This is a log-flood
/// suppressor, not a correctness primitive.
#[derive(Debug)]
pub struct RateGate {
    gag_millis: u64,
    last_emitted: AtomicU64,
}

impl RateGate {
    /// Creates a gate with the given gag period.
    pub fn new(gag_period: Duration) -> Self {
        Self { gag_millis: gag_period.as_millis() as u64, last_emitted: AtomicU64::new(NEVER) }
    }

    /// Returns `true` if a diagnostic may be emitted at `now`, recording the
    /// emission; `false` if it must be suppressed.
    pub fn allow(&self, now: SystemTime) -> bool {
        let now_millis =
            now.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
        let last = self.last_emitted.load(Ordering::Relaxed);
        if last != NEVER && now_millis.saturating_sub(last) <= self.gag_millis {
            return false;
        }
        self.last_emitted
            .compare_exchange(last, now_millis, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_GAG_PERIOD)
    }
}
