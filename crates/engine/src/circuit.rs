use std::sync::Arc;

use parking_lot::Mutex;
use todoat_core::Clock;

/// A per-backend circuit breaker's visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    failure_count: u32,
    state: CircuitState,
    opened_at: Option<std::time::Instant>,
}

/// Fault isolation for a single backend.
///
/// `Allow()` is the gate every sync attempt passes through first; a
/// denied call never reaches the backend. Thread-safe: all transitions
/// are serialized behind one lock, matching the "individually
/// thread-safe" requirement.
pub struct CircuitBreaker<C: Clock> {
    threshold: u32,
    cooldown: std::time::Duration,
    clock: C,
    inner: Mutex<Inner>,
}

impl<C: Clock> CircuitBreaker<C> {
    pub const DEFAULT_THRESHOLD: u32 = 3;
    pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

    pub fn new(threshold: u32, cooldown: std::time::Duration, clock: C) -> Self {
        Self {
            threshold,
            cooldown,
            clock,
            inner: Mutex::new(Inner { failure_count: 0, state: CircuitState::Closed, opened_at: None }),
        }
    }

    pub fn with_defaults(clock: C) -> Self {
        Self::new(
            Self::DEFAULT_THRESHOLD,
            std::time::Duration::from_secs(Self::DEFAULT_COOLDOWN_SECS),
            clock,
        )
    }

    /// True if a call is permitted right now. Transitions OPEN -> HALF_OPEN
    /// when the cooldown has elapsed, admitting exactly one probe.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("OPEN state always has opened_at");
                if self.clock.now().duration_since(opened_at) >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call. From any state, returns to CLOSED with
    /// the failure count reset.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
    }

    /// Record a failed call. Trips to OPEN once `failure_count` reaches
    /// `threshold`; a failure while HALF_OPEN always re-opens.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(self.clock.now());
            }
            CircuitState::Closed | CircuitState::Open => {
                inner.failure_count += 1;
                if inner.failure_count >= self.threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(self.clock.now());
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }
}

/// Shareable handle, since a `BackendEntry` is held by both the scheduler
/// loop and any IPC handler reading `status`.
pub type SharedCircuitBreaker<C> = Arc<CircuitBreaker<C>>;

#[cfg(test)]
#[path = "circuit_tests.rs"]
mod tests;
