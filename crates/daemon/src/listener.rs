//! The control socket: a Unix domain socket accepting one request per
//! connection and replying with exactly one response, per the daemon's
//! newline-delimited JSON IPC protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use todoat_wire::{read_message, write_message, Request, Response};
use tracing::{debug, warn};

use crate::error::DaemonError;
use crate::pidfile::set_owner_only_mode;
use crate::scheduler::Scheduler;
use crate::shutdown::ShutdownKernel;

/// Binds the control socket and drives the accept loop. Each connection is
/// handled on its own task so one slow or misbehaving client never blocks
/// the next.
pub struct Listener {
    inner: UnixListener,
    path: PathBuf,
}

impl Listener {
    /// Remove a stale socket file left behind by a previous process, then
    /// bind fresh and restrict it to owner access.
    pub fn bind(path: &Path) -> Result<Self, DaemonError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| DaemonError::BindFailed(path.to_path_buf(), e))?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DaemonError::BindFailed(path.to_path_buf(), e))?;
        }
        let inner = UnixListener::bind(path).map_err(|e| DaemonError::BindFailed(path.to_path_buf(), e))?;
        set_owner_only_mode(path).map_err(|e| DaemonError::BindFailed(path.to_path_buf(), e))?;
        Ok(Self { inner, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until `kernel` is cancelled. Every accepted
    /// connection is handled on its own spawned task.
    pub async fn run(self, scheduler: Arc<Scheduler>, kernel: &'static ShutdownKernel, shutdown_deadline: Duration) {
        let token = kernel.token();
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = self.inner.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let scheduler = scheduler.clone();
                            tokio::spawn(handle_connection(stream, scheduler, kernel, shutdown_deadline));
                        }
                        Err(e) => warn!(error = %e, "failed to accept a control socket connection"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, scheduler: Arc<Scheduler>, kernel: &'static ShutdownKernel, shutdown_deadline: Duration) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let request: Request = match read_message(&mut reader).await {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "dropping control connection on framing error");
            return;
        }
    };

    let response = dispatch(request, &scheduler, kernel, shutdown_deadline).await;
    if let Err(e) = write_message(&mut write_half, &response).await {
        debug!(error = %e, "failed to write control socket response");
    }
}

async fn dispatch(request: Request, scheduler: &Arc<Scheduler>, kernel: &'static ShutdownKernel, shutdown_deadline: Duration) -> Response {
    if kernel.is_shutting_down() && !matches!(request, Request::Status) {
        return Response::shutting_down();
    }

    match request {
        Request::Notify => {
            scheduler.notify();
            Response::Notify { ok: true, error: None }
        }
        Request::Status => Response::Status(scheduler.status_response()),
        Request::Stop => {
            let kernel_handle = kernel;
            tokio::spawn(async move {
                if let Err(e) = kernel_handle.shutdown(shutdown_deadline).await {
                    warn!(error = %e, "shutdown requested over the control socket did not complete cleanly");
                }
            });
            Response::Stop { ok: true }
        }
        Request::Unknown => Response::unknown_method(),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
