//! IPC protocol for daemon <-> CLI communication.
//!
//! Wire format: newline-delimited UTF-8 JSON. One request, one response,
//! then the server closes the connection.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod status;
mod wire;

pub use request::Request;
pub use response::Response;
pub use status::{BackendStatus, CircuitState, StatusSnapshot};
pub use wire::{read_message, write_message, ProtocolError};
