//! Exponential backoff.

use std::time::Duration;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// `min(initial * 2^(attempt-1), max)`; zero for attempt 0. No jitter: the
/// retry schedule of a call is fully determined by its policy.
pub fn calculate_backoff(attempt: u32, initial: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
    initial.checked_mul(factor).unwrap_or(max).min(max)
}
