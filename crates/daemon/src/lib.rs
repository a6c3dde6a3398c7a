//! The sync daemon: scheduler loop, control socket, heartbeat, and the
//! graceful shutdown kernel everything else observes.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod heartbeat;
pub mod listener;
pub mod logging;
pub mod pidfile;
pub mod scheduler;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use error::DaemonError;
pub use heartbeat::{check_daemon_health, write_heartbeat, HealthStatus};
pub use listener::Listener;
pub use logging::{init_console_logging, BackgroundLogger};
pub use pidfile::PidFile;
pub use scheduler::{BackendEntry, Scheduler, SyncFn, SyncFuture, TimeoutCallback};
pub use shutdown::ShutdownKernel;
pub use startup::{Daemon, DaemonPaths, DaemonSettings};
