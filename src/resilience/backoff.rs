//! Delay with jitter between silent retries.

use std::time::Duration;
use rand::Rng;

/// Delay before the next stale-connection retry.
///
/// The configured delay plus 0 to 10% jitter, so a burst of calls that lost
/// the same pooled connection do not all reconnect in the same instant.
pub fn stale_retry_delay(delay_ms: u64) -> Duration {
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms + jitter)
}
