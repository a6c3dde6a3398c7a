use serde::{Deserialize, Serialize};

use crate::status::StatusSnapshot;

/// A response returned by the daemon over the control socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Reply to `notify`: enqueued (or rejected, e.g. while shutting down).
    Notify {
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Reply to `status`.
    Status(StatusSnapshot),
    /// Reply to `stop`.
    Stop { ok: bool },
    /// Reply to an unrecognized request `type`, or to a request cancelled
    /// by an in-flight shutdown. Always `ok: false`.
    Error { ok: bool, error: String },
}

impl Response {
    pub fn unknown_method() -> Self {
        Response::Error { ok: false, error: "unknown method".into() }
    }

    pub fn shutting_down() -> Self {
        Response::Error { ok: false, error: "shutting down".into() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
