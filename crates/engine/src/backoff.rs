use std::time::Duration;

/// Maximum backoff delay, in seconds.
const MAX_BACKOFF_SECS: u64 = 60;

/// `min(2^n, 60)` seconds. Applied between scheduler ticks only when every
/// backend's circuit is open or every backend's last attempt failed —
/// the caller decides when that condition holds; this function is pure.
pub fn backoff_delay(consecutive_all_fail_ticks: u32) -> Duration {
    let secs = 2u64.checked_pow(consecutive_all_fail_ticks).unwrap_or(u64::MAX).min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
