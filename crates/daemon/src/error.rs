use std::path::PathBuf;

use thiserror::Error;

/// Failures that can end the daemon process itself (as opposed to a
/// per-backend sync failure, which is recorded and survived).
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("daemon already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("failed to bind control socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("cleanup {0:?} did not complete before the shutdown deadline")]
    ShutdownTimeout(String),

    #[error("wire protocol error: {0}")]
    Protocol(#[from] todoat_wire::ProtocolError),
}
