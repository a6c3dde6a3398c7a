// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! todoat-core: data model, error taxonomy, backend contract, and config
//! loading shared by every other `todoat-*` crate.

pub mod macros;

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod model;

pub use backend::{Backend, Ctx};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use id::short;
#[cfg(any(test, feature = "test-support"))]
pub use model::{ListBuilder, TaskBuilder};
pub use model::{List, ListId, Task, TaskId, TaskStatus};
