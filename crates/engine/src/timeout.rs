use std::future::Future;
use std::time::Duration;

use todoat_core::Error;

/// Race `fut` against `task_timeout`, if one is configured.
/// When `task_timeout` is `None` the daemon root
/// context is used directly (no deadline). The backend's future is never
/// actually aborted if it ignores cancellation — this can only out-wait
/// it and report `Error::Timeout`.
pub async fn run_with_timeout<F, T>(task_timeout: Option<Duration>, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match task_timeout {
        None => fut.await,
        Some(deadline) => match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        },
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
