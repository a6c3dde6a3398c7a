use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::DaemonError;

type Cleanup = Box<dyn FnOnce() + Send>;

/// Process-wide shutdown coordinator: a cancellation token every
/// long-running task observes, plus a LIFO cleanup registry. `shutdown()`
/// is idempotent — only the first caller's cleanups run; later callers
/// (concurrent signal handlers, an IPC `stop`, the idle watchdog) get the
/// same `Ok(())` for free.
pub struct ShutdownKernel {
    token: CancellationToken,
    cleanups: Mutex<Vec<(String, Cleanup)>>,
    done: AtomicBool,
}

impl ShutdownKernel {
    pub fn new() -> Self {
        Self { token: CancellationToken::new(), cleanups: Mutex::new(Vec::new()), done: AtomicBool::new(false) }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Register a cleanup to run on `shutdown()`, in LIFO order relative to
    /// every other registered cleanup.
    pub fn register_cleanup(&self, name: impl Into<String>, cleanup: impl FnOnce() + Send + 'static) {
        self.cleanups.lock().push((name.into(), Box::new(cleanup)));
    }

    /// Cancel the root token, then run cleanups in LIFO order, each bounded
    /// by `deadline`. A cleanup that blows the deadline stops the drain and
    /// reports which one; earlier (already-run) cleanups are not undone.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), DaemonError> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.token.cancel();
        let cleanups = std::mem::take(&mut *self.cleanups.lock());
        for (name, cleanup) in cleanups.into_iter().rev() {
            let handle = tokio::task::spawn_blocking(cleanup);
            match tokio::time::timeout(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(cleanup = %name, error = %e, "cleanup task panicked"),
                Err(_) => return Err(DaemonError::ShutdownTimeout(name)),
            }
        }
        Ok(())
    }
}

impl Default for ShutdownKernel {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<ShutdownKernel> = OnceLock::new();

/// The process-wide singleton, lazily and safely initialized on first use.
/// The Logger (see `logging`) and this kernel are the only two sanctioned
/// globals in the daemon.
pub fn global() -> &'static ShutdownKernel {
    GLOBAL.get_or_init(ShutdownKernel::new)
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
