//! `todoat daemon` — start, stop, restart, and inspect the sync daemon.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use todoat_core::config;
use todoat_daemon::{Daemon, DaemonPaths, DaemonSettings};

use crate::client::DaemonClient;
use crate::color;
use crate::exit_error::ExitError;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (forks and detaches by default).
    Start(StartArgs),
    /// Stop the running daemon.
    Stop,
    /// Print a status snapshot from the running daemon.
    Status,
    /// Stop and restart the daemon.
    Restart(StartArgs),
}

#[derive(Args, Clone, Default)]
pub struct StartArgs {
    /// Default per-backend sync interval, in seconds.
    #[arg(long)]
    pub daemon_interval: Option<u64>,
    /// Per-backend sync timeout, in minutes.
    #[arg(long)]
    pub daemon_task_timeout: Option<u64>,
    #[arg(long)]
    pub daemon_pid: Option<PathBuf>,
    #[arg(long)]
    pub daemon_socket: Option<PathBuf>,
    #[arg(long)]
    pub daemon_log: Option<PathBuf>,
    #[arg(long)]
    pub daemon_heartbeat: Option<PathBuf>,
    #[arg(long)]
    pub daemon_heartbeat_interval: Option<u64>,
    #[arg(long)]
    pub daemon_idle_timeout: Option<u64>,
    #[arg(long)]
    pub daemon_stuck_timeout: Option<u64>,
    /// Run attached to this terminal instead of forking into the background.
    #[arg(long)]
    pub daemon_foreground: bool,
    /// Set on the re-executed child; never passed by a user directly.
    #[arg(long, hide = true)]
    pub daemon_child: bool,
}

impl StartArgs {
    fn paths(&self) -> DaemonPaths {
        DaemonPaths {
            pid_file: self.daemon_pid.clone().unwrap_or_else(config::pid_file),
            socket_file: self.daemon_socket.clone().unwrap_or_else(config::socket_file),
            heartbeat_file: self.daemon_heartbeat.clone().unwrap_or_else(config::heartbeat_file),
            log_file: self.daemon_log.clone().unwrap_or_else(config::log_file),
            version_file: config::runtime_dir().join("daemon.version"),
        }
    }

    fn settings(&self, defaults: &config::DaemonConfig) -> DaemonSettings {
        DaemonSettings {
            interval: self.daemon_interval.map(Duration::from_secs).unwrap_or_else(|| Duration::from_secs(defaults.interval_secs)),
            task_timeout: self.daemon_task_timeout.map(|m| Duration::from_secs(m * 60)).or_else(|| defaults.task_timeout()),
            idle_timeout: self.daemon_idle_timeout.map(Duration::from_secs).or_else(|| defaults.idle_timeout()),
            heartbeat_interval: self.daemon_heartbeat_interval.map(Duration::from_secs).or_else(|| defaults.heartbeat_interval()),
            stuck_timeout: self.daemon_stuck_timeout.map(Duration::from_secs).unwrap_or_else(|| defaults.stuck_timeout()),
            background_log_enabled: true,
        }
    }

    /// Re-build the argument list a re-exec would need to hand the same
    /// settings to the detached child, with `--daemon-child` appended.
    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["daemon".to_string(), "start".to_string()];
        if let Some(v) = self.daemon_interval {
            args.push(format!("--daemon-interval={v}"));
        }
        if let Some(v) = self.daemon_task_timeout {
            args.push(format!("--daemon-task-timeout={v}"));
        }
        if let Some(v) = &self.daemon_pid {
            args.push(format!("--daemon-pid={}", v.display()));
        }
        if let Some(v) = &self.daemon_socket {
            args.push(format!("--daemon-socket={}", v.display()));
        }
        if let Some(v) = &self.daemon_log {
            args.push(format!("--daemon-log={}", v.display()));
        }
        if let Some(v) = &self.daemon_heartbeat {
            args.push(format!("--daemon-heartbeat={}", v.display()));
        }
        if let Some(v) = self.daemon_heartbeat_interval {
            args.push(format!("--daemon-heartbeat-interval={v}"));
        }
        if let Some(v) = self.daemon_idle_timeout {
            args.push(format!("--daemon-idle-timeout={v}"));
        }
        if let Some(v) = self.daemon_stuck_timeout {
            args.push(format!("--daemon-stuck-timeout={v}"));
        }
        args.push("--daemon-child".to_string());
        args
    }
}

pub async fn daemon(args: DaemonArgs) -> Result<()> {
    match args.command {
        DaemonCommand::Start(start_args) => start(start_args).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
        DaemonCommand::Restart(start_args) => restart(start_args).await,
    }
}

async fn start(start_args: StartArgs) -> Result<()> {
    let config = config::Config::load_default()?;
    let paths = start_args.paths();
    let settings = start_args.settings(&config.daemon);

    if start_args.daemon_foreground || start_args.daemon_child {
        let daemon = Daemon::new(paths, settings, Vec::new());
        daemon.run().await.map_err(|e| anyhow!("{e}"))?;
        return Ok(());
    }

    if let Ok(snapshot) = DaemonClient::new(paths.socket_file.clone()).status().await {
        println!("Daemon already running (pid {})", snapshot.pid);
        return Ok(());
    }

    spawn_detached(&start_args, &paths.log_file)?;
    wait_for_socket(&paths.socket_file).await?;
    println!("Daemon started ({})", color::muted(&paths.socket_file.display().to_string()));
    Ok(())
}

async fn stop() -> Result<()> {
    let socket = config::socket_file();
    match DaemonClient::new(socket).stop().await {
        Ok(()) => {
            println!("Daemon stopped");
            Ok(())
        }
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("failed to stop daemon: {e}")),
    }
}

async fn status() -> Result<()> {
    let socket = config::socket_file();
    let client = DaemonClient::new(socket);
    match client.status().await {
        Ok(snapshot) => {
            println!("{}", color::header("Status: running"));
            println!("pid: {}", snapshot.pid);
            println!("started_at: {}", snapshot.started_at);
            println!("sync_count: {}", snapshot.sync_count);
            for (name, backend) in &snapshot.backends {
                println!(
                    "  {name}: {} sync, {} errors, circuit {}",
                    backend.sync_count, backend.error_count, backend.circuit_state
                );
            }
            Ok(())
        }
        Err(e) if e.is_not_running() => Err(ExitError::new(3, "daemon not running").into()),
        Err(e) => Err(anyhow!("{e}")),
    }
}

async fn restart(start_args: StartArgs) -> Result<()> {
    let socket = config::socket_file();
    let was_running = DaemonClient::new(socket).stop().await.is_ok();
    if was_running {
        // A grace period for the OS to release the Unix socket after the
        // previous daemon process exits.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    start(start_args).await
}

// Re-executes the binary with `--daemon-child` and redirects its stdio to
// the log file, then returns without waiting. Full session detachment would
// need `CommandExt::pre_exec` to call `setsid()`, but that API is an
// `unsafe fn` and this workspace forbids unsafe code outright, so the
// child stays in the parent's session; it still outlives the parent once
// the parent process exits; see DESIGN.md.
fn spawn_detached(start_args: &StartArgs, log_path: &std::path::Path) -> Result<()> {
    let exe = std::env::current_exe()?;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    let log_file_err = log_file.try_clone()?;

    Command::new(exe)
        .args(start_args.to_cli_args())
        .stdin(Stdio::null())
        .stdout(log_file)
        .stderr(log_file_err)
        .spawn()
        .map_err(|e| anyhow!("failed to start daemon: {e}"))?;
    Ok(())
}

async fn wait_for_socket(path: &std::path::Path) -> Result<()> {
    for _ in 0..50 {
        if path.exists() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(anyhow!("daemon did not start within 5s (no socket at {})", path.display()))
}
