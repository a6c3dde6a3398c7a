//! Ties every daemon subsystem together: directory/file setup, the
//! listener, the scheduler, the heartbeat writer, the idle-timeout
//! watchdog, and signal handling, in the startup order spec'd for a
//! long-lived worker process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::DaemonError;
use crate::heartbeat::run_heartbeat_writer;
use crate::listener::Listener;
use crate::logging::BackgroundLogger;
use crate::pidfile::PidFile;
use crate::scheduler::{BackendEntry, Scheduler};
use crate::shutdown::ShutdownKernel;
use crate::signals;

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// Every filesystem location the daemon owns for its lifetime, resolved
/// up front so startup and shutdown agree on exactly what to create and
/// remove.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub pid_file: PathBuf,
    pub socket_file: PathBuf,
    pub heartbeat_file: PathBuf,
    pub log_file: PathBuf,
    pub version_file: PathBuf,
}

impl DaemonPaths {
    pub fn from_runtime_dir(runtime_dir: &std::path::Path) -> Self {
        Self {
            pid_file: runtime_dir.join("daemon.pid"),
            socket_file: runtime_dir.join("daemon.sock"),
            heartbeat_file: runtime_dir.join("daemon.heartbeat"),
            log_file: runtime_dir.join("daemon.log"),
            version_file: runtime_dir.join("daemon.version"),
        }
    }
}

/// The daemon's tunables, one field per CLI flag / config entry from
/// `todoat_core::config::DaemonConfig`.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub interval: Duration,
    pub task_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub heartbeat_interval: Option<Duration>,
    pub stuck_timeout: Duration,
    pub background_log_enabled: bool,
}

/// A fully assembled daemon, ready to run. Built by the CLI's `daemon
/// start` path (or directly by tests, in-process, with no fork).
pub struct Daemon {
    paths: DaemonPaths,
    settings: DaemonSettings,
    backends: Vec<Arc<BackendEntry>>,
}

impl Daemon {
    pub fn new(paths: DaemonPaths, settings: DaemonSettings, backends: Vec<Arc<BackendEntry>>) -> Self {
        Self { paths, settings, backends }
    }

    /// Runs the daemon to completion: binds everything, spawns every
    /// subsystem task, and returns once a clean shutdown has drained the
    /// cleanup registry. Never forks — forking is the CLI's concern.
    pub async fn run(self) -> Result<(), DaemonError> {
        let kernel: &'static ShutdownKernel = Box::leak(Box::new(ShutdownKernel::new()));

        for path in [&self.paths.pid_file, &self.paths.socket_file, &self.paths.heartbeat_file, &self.paths.log_file] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
                set_owner_only_dir(parent)?;
            }
        }

        let pid_file = PidFile::acquire(&self.paths.pid_file)?;
        let pid_path = pid_file.path().to_path_buf();
        kernel.register_cleanup("pid_file", move || {
            let _ = std::fs::remove_file(&pid_path);
        });

        std::fs::write(&self.paths.version_file, env!("CARGO_PKG_VERSION"))?;

        let logger = BackgroundLogger::spawn(self.paths.log_file.clone(), self.settings.background_log_enabled);
        logger.log(format!("daemon starting, pid {}", std::process::id()));

        let listener = Listener::bind(&self.paths.socket_file)?;
        let socket_path = listener.path().to_path_buf();
        kernel.register_cleanup("socket_file", move || {
            let _ = std::fs::remove_file(&socket_path);
        });

        if self.settings.heartbeat_interval.is_some() {
            let heartbeat_path = self.paths.heartbeat_file.clone();
            kernel.register_cleanup("heartbeat_file", move || {
                let _ = std::fs::remove_file(&heartbeat_path);
            });
        }

        signals::install(kernel, SHUTDOWN_DEADLINE);

        let scheduler = Scheduler::new(self.backends, self.settings.interval, self.settings.task_timeout);
        let logger_for_timeouts = logger;
        scheduler.set_on_task_timeout(Arc::new(move |name, elapsed| {
            logger_for_timeouts.log(format!("backend {name} timed out after {}ms", elapsed.as_millis()));
        }));

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(scheduler.clone().run(kernel, SHUTDOWN_DEADLINE)));
        tasks.push(tokio::spawn(listener.run(scheduler.clone(), kernel, SHUTDOWN_DEADLINE)));

        if let Some(interval) = self.settings.heartbeat_interval {
            tasks.push(tokio::spawn(run_heartbeat_writer(self.paths.heartbeat_file.clone(), interval, kernel.token())));
        }

        if let Some(idle_timeout) = self.settings.idle_timeout {
            let scheduler = scheduler.clone();
            tasks.push(tokio::spawn(async move {
                idle_watchdog(scheduler, kernel, idle_timeout).await;
            }));
        }

        {
            let scheduler = scheduler.clone();
            let heartbeat_path = self.paths.heartbeat_file.clone();
            let heartbeat_interval = self.settings.heartbeat_interval;
            let stuck_timeout = self.settings.stuck_timeout;
            tasks.push(tokio::spawn(async move {
                stuck_watchdog(scheduler, kernel, stuck_timeout, heartbeat_path, heartbeat_interval).await;
            }));
        }

        info!(pid = std::process::id(), socket = %self.paths.socket_file.display(), "daemon started");
        kernel.token().cancelled().await;

        for task in tasks {
            let _ = task.await;
        }

        info!("daemon stopped cleanly");
        Ok(())
    }
}

async fn idle_watchdog(scheduler: Arc<Scheduler>, kernel: &'static ShutdownKernel, idle_timeout: Duration) {
    let poll_interval = (idle_timeout / 4).max(Duration::from_millis(50));
    loop {
        let token = kernel.token();
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
        if scheduler.idle_for() >= idle_timeout {
            info!(idle_for_secs = scheduler.idle_for().as_secs(), "idle timeout reached; initiating graceful shutdown");
            let _ = kernel.shutdown(SHUTDOWN_DEADLINE).await;
            break;
        }
    }
}

/// Polls the claims table for backends whose sync call has outlived
/// `stuck_timeout` — only reachable when `task_timeout` is disabled and a
/// backend hangs, since a configured `task_timeout` always releases the
/// claim first. Logs each one found; it does not force the backend's
/// future to drop, since there is no abort handle for it to cancel.
async fn stuck_watchdog(
    scheduler: Arc<Scheduler>,
    kernel: &'static ShutdownKernel,
    stuck_timeout: Duration,
    heartbeat_path: PathBuf,
    heartbeat_interval: Option<Duration>,
) {
    let poll_interval = (stuck_timeout / 4).max(Duration::from_secs(1));
    loop {
        let token = kernel.token();
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
        let daemon_alive = match heartbeat_interval {
            Some(interval) => crate::heartbeat::check_daemon_health(&heartbeat_path, interval).healthy,
            None => true,
        };
        for name in scheduler.stuck_backends(stuck_timeout, daemon_alive) {
            tracing::warn!(backend = %name, stuck_timeout_secs = stuck_timeout.as_secs(), "backend sync claim exceeded stuck_timeout");
        }
    }
}

#[cfg(unix)]
fn set_owner_only_dir(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_owner_only_dir(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
