//! Per-backend fault isolation: circuit breaker, backoff, error-loop
//! cutoff, per-task timeout, and stuck-operation detection.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod backoff;
mod circuit;
mod cutoff;
mod stuck;
mod timeout;

pub use backoff::backoff_delay;
pub use circuit::{CircuitBreaker, CircuitState};
pub use cutoff::{ConsecutiveErrorCutoff, CutoffOutcome};
pub use stuck::{stuck_operations, Claim};
pub use timeout::run_with_timeout;
