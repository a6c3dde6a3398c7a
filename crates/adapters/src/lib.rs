//! Reference `Backend` implementations.
//!
//! These adapters illustrate the capability contract every real backend
//! (CalDAV, a vendor REST API, local SQLite) must satisfy; they are not
//! themselves production sync targets.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod file;
mod memory;

pub use file::{FileBackend, FileBackendError};
pub use memory::MemoryBackend;
