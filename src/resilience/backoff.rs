//! Exponential backoff with jitter for caller-side routing retries.
//!
//! The engine never retries on its own; a client that receives
//! `no_responders` waits [`calculate_backoff`] before calling again so the
//! widened radius has a chance to pick up newly verified responders.

use rand::Rng;
use std::time::Duration;

/// Ceiling of [`retry_delay`], as a multiple of the base delay.
pub const MAX_BACKOFF_FACTOR: u64 = 16;

/// Delay before retry number `attempt` (1-based). Attempt 0 is immediate.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);

    // Up to 10% jitter on top of the capped delay
    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped.saturating_add(jitter))
}

/// Backoff for `no_responders` retries, capped at [`MAX_BACKOFF_FACTOR`] × `base_ms`.
pub fn retry_delay(attempt: u32, base_ms: u64) -> Duration {
    calculate_backoff(attempt, base_ms, base_ms.saturating_mul(MAX_BACKOFF_FACTOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_backoff(0, 100, 2000), Duration::ZERO);

        let first = calculate_backoff(1, 100, 2000).as_millis();
        assert!((100..110).contains(&first));

        let third = calculate_backoff(3, 100, 2000).as_millis();
        assert!((400..440).contains(&third));

        let capped = calculate_backoff(30, 100, 1000).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_retry_delay_saturates_on_huge_base() {
        let delay = retry_delay(3, u64::MAX);
        assert_eq!(delay, Duration::from_millis(u64::MAX));

        let normal = retry_delay(10, 500).as_millis();
        assert!((8_000..8_800).contains(&normal));
    }
}
