//! Inter-round backoff
//!
//! Rounds are spaced by a configured base delay plus a uniform jitter in
//! `[-jitter, +jitter]`, clamped at zero. The jitter keeps multiple
//! deployments (and this process across rounds) from hammering the remote
//! service on a fixed cadence.

use std::time::Duration;

use rand::RngExt;

/// Compute the delay before the next round.
pub fn jittered_delay(base: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return base;
    }
    let base_ms = base.as_millis() as i64;
    let jitter_ms = jitter.as_millis() as i64;
    let offset = rand::rng().random_range(-jitter_ms..=jitter_ms);
    Duration::from_millis((base_ms + offset).max(0) as u64)
}
