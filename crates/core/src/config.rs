//! Configuration loading and XDG path resolution.
//!
//! `Config` is intentionally thin: the daemon and CLI layer their own
//! flags and defaults on top of what is loaded here, per the priority
//! documented on each field's accessor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from).filter(|p| !p.as_os_str().is_empty())
}

/// Resolves `$XDG_CONFIG_HOME/todoat`, falling back to `~/.config/todoat`.
pub fn config_dir() -> PathBuf {
    env_path("XDG_CONFIG_HOME")
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"))
        .join("todoat")
}

/// Resolves `$XDG_DATA_HOME/todoat`, falling back to `~/.local/share/todoat`.
pub fn data_dir() -> PathBuf {
    env_path("XDG_DATA_HOME")
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
        .join("todoat")
}

/// Resolves `$XDG_CACHE_HOME/todoat`, falling back to `~/.cache/todoat`.
pub fn cache_dir() -> PathBuf {
    env_path("XDG_CACHE_HOME")
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".cache"))
        .join("todoat")
}

/// Resolves `$XDG_RUNTIME_DIR/todoat`, falling back to `/tmp/todoat-<uid>`
/// when `XDG_RUNTIME_DIR` is unset (matching the per-UID socket fallback
/// over the control socket).
pub fn runtime_dir() -> PathBuf {
    match env_path("XDG_RUNTIME_DIR") {
        Some(dir) => dir.join("todoat"),
        None => std::env::temp_dir().join(format!("todoat-{}", current_uid())),
    }
}

#[cfg(unix)]
fn current_uid() -> u32 {
    nix::unistd::Uid::current().as_raw()
}

#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}

pub fn cache_file() -> PathBuf {
    cache_dir().join("lists.json")
}

pub fn socket_file() -> PathBuf {
    runtime_dir().join("daemon.sock")
}

pub fn pid_file() -> PathBuf {
    runtime_dir().join("daemon.pid")
}

pub fn heartbeat_file() -> PathBuf {
    runtime_dir().join("daemon.heartbeat")
}

pub fn log_file() -> PathBuf {
    runtime_dir().join("daemon.log")
}

pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Logging sub-config (`logging.background_enabled`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub background_enabled: bool,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { background_enabled: true, verbose: false }
    }
}

/// Daemon sub-config. Every field here has a CLI flag override in
/// `todoat daemon`; this struct holds the config-file layer,
/// the lowest-priority source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub interval_secs: u64,
    pub task_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub stuck_timeout_secs: u64,
    pub background_pull_cooldown_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            task_timeout_secs: 5 * 60,
            idle_timeout_secs: 0,
            heartbeat_interval_secs: 5,
            stuck_timeout_secs: 10 * 60,
            background_pull_cooldown_secs: 30,
        }
    }
}

impl DaemonConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.task_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.idle_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        non_zero_secs(self.heartbeat_interval_secs)
    }

    pub fn stuck_timeout(&self) -> Duration {
        Duration::from_secs(self.stuck_timeout_secs)
    }

    pub fn background_pull_cooldown(&self) -> Option<Duration> {
        non_zero_secs(self.background_pull_cooldown_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Top-level config, loaded from `$XDG_CONFIG_HOME/todoat/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: String,
    pub cache_ttl_secs: u64,
    pub analytics_enabled: bool,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            cache_ttl_secs: 5 * 60,
            analytics_enabled: true,
            daemon: DaemonConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load from `path`, falling back to defaults if the file does not
    /// exist. A malformed file is an error — unlike the list cache, a
    /// bad config is not silently discarded.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_yaml::from_str(&contents)
                .map_err(|e| Error::InvalidInput(format!("config {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(Error::Internal(format!("reading {}: {e}", path.display()))),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from the default XDG-resolved location.
    pub fn load_default() -> Result<Self> {
        Self::load(&config_file())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = std::env::var_os("TODOAT_ANALYTICS_ENABLED") {
            if let Some(parsed) = parse_bool(value.to_string_lossy().as_ref()) {
                self.analytics_enabled = parsed;
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
