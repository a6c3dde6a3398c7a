//! Error taxonomy shared by every backend and by the daemon's safety layer.
//!
//! Backends return [`Error`] from every [`crate::backend::Backend`] method.
//! The daemon never converts [`Error::Offline`] or [`Error::Timeout`] into a
//! process failure: they are counted, backed off, and possibly used to trip
//! a circuit breaker. Only the global consecutive-error cutoff or a fatal
//! startup error ends the daemon.

use thiserror::Error;

/// The kinds of failure a backend or the core can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested entity does not exist. "Get by id/name" queries never
    /// return this — they return `Ok(None)` — but mutations (update,
    /// delete, create-under-missing-parent) do.
    #[error("{0} not found")]
    NotFound(String),

    /// The backend cannot perform this operation at all (e.g. a file-backed
    /// store asked to restore a soft-deleted list).
    #[error("{0} is not supported by this backend")]
    Unsupported(String),

    /// A concurrent modification was detected on `field` during sync.
    /// The core only detects and reports conflicts; reconciliation strategy
    /// is a backend decision (see DESIGN.md open question).
    #[error("conflicting modification to {0}")]
    Conflict(String),

    /// Credentials are missing, invalid, or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// The network is unreachable: DNS failure, connection refused, or a
    /// transport-level timeout talking to the remote service.
    #[error("offline: {0}")]
    Offline(String),

    /// A field failed validation (e.g. priority out of `[0,9]`, empty
    /// summary, `start_date > due_date`, a cyclic parent chain).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation exceeded its deadline (`task_timeout`).
    #[error("operation timed out")]
    Timeout,

    /// The call was short-circuited because the backend's circuit breaker
    /// is open.
    #[error("circuit open")]
    CircuitOpen,

    /// Unclassified. Never silently swallowed — always logged by the
    /// caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// A short machine-stable tag for this error kind, used in structured
    /// log fields and in the IPC `status` response's `last_error` text.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Unsupported(_) => "unsupported",
            Error::Conflict(_) => "conflict",
            Error::Unauthorized => "unauthorized",
            Error::Offline(_) => "offline",
            Error::InvalidInput(_) => "invalid_input",
            Error::Timeout => "timeout",
            Error::CircuitOpen => "circuit_open",
            Error::Internal(_) => "internal",
        }
    }

    /// User-facing suggestion for CLI surfaces mapping this error to a
    /// message with actionable remediation.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Offline(_) => Some("Check your DNS settings and internet connection"),
            Error::Unauthorized => Some("Verify your credentials have not expired"),
            Error::Timeout => Some("The backend is slow to respond; try again shortly"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
