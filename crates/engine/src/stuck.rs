use std::time::{Duration, Instant};

/// A claimed operation as seen by the stuck-detector: who claimed it and
/// when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub operation_id: String,
    pub worker_id: String,
    pub claimed_at: Instant,
}

/// Returns the operations whose claim is older than `stuck_timeout` AND
/// whose claiming worker is no longer alive, per `is_worker_alive`.
///
/// `is_worker_alive` is expected to check the worker's heartbeat file —
/// kept as a closure here so the engine crate doesn't need filesystem
/// access to reason about staleness.
pub fn stuck_operations<'a>(
    claims: &'a [Claim],
    now: Instant,
    stuck_timeout: Duration,
    mut is_worker_alive: impl FnMut(&str) -> bool,
) -> Vec<&'a Claim> {
    claims
        .iter()
        .filter(|claim| now.duration_since(claim.claimed_at) >= stuck_timeout)
        .filter(|claim| !is_worker_alive(&claim.worker_id))
        .collect()
}

#[cfg(test)]
#[path = "stuck_tests.rs"]
mod tests;
