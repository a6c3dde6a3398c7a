use std::sync::atomic::{AtomicU32, Ordering};

/// What a sync pass should do after recording this tick's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffOutcome {
    Continue,
    ShutDown,
}

/// The global, daemon-wide consecutive-error counter.
///
/// One instance per daemon, shared across every backend's ticks. A single
/// successful sync anywhere resets the counter to zero — the partial
/// success rule: as long as *any* backend succeeded in the pass, the
/// counter does not increment.
pub struct ConsecutiveErrorCutoff {
    threshold: u32,
    count: AtomicU32,
}

impl ConsecutiveErrorCutoff {
    pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

    pub fn new(threshold: u32) -> Self {
        Self { threshold, count: AtomicU32::new(0) }
    }

    pub fn with_default_threshold() -> Self {
        Self::new(Self::DEFAULT_MAX_CONSECUTIVE_ERRORS)
    }

    /// Record one backend sync (or circuit-blocked tick) succeeding.
    pub fn record_success(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Record one backend sync (or circuit-blocked tick) failing. Returns
    /// whether the daemon should now initiate graceful shutdown.
    pub fn record_failure(&self) -> CutoffOutcome {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.threshold {
            CutoffOutcome::ShutDown
        } else {
            CutoffOutcome::Continue
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "cutoff_tests.rs"]
mod tests;
