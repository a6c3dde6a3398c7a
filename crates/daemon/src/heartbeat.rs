use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::pidfile::set_owner_only_mode;

/// Overwrite the heartbeat file atomically (temp file + rename) with the
/// current time in RFC3339Nano.
pub fn write_heartbeat(path: &Path) -> std::io::Result<()> {
    let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
    let tmp = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&tmp, now.as_bytes())?;
    set_owner_only_mode(&tmp)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Result of a health probe: whether the daemon looks alive, and why (or
/// why not) — surfaced to the CLI without it ever touching the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub reason: String,
}

impl HealthStatus {
    fn healthy() -> Self {
        Self { healthy: true, reason: "healthy".into() }
    }

    fn unhealthy(reason: impl Into<String>) -> Self {
        Self { healthy: false, reason: reason.into() }
    }
}

/// Staleness test: `now - parse(file) > 2 * heartbeat_interval`. A missing
/// file is unhealthy too — there is no daemon to have written it.
pub fn check_daemon_health(path: &Path, heartbeat_interval: Duration) -> HealthStatus {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return HealthStatus::unhealthy("heartbeat file missing"),
    };
    let parsed: DateTime<Utc> = match DateTime::parse_from_rfc3339(contents.trim()) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => return HealthStatus::unhealthy("heartbeat file unparsable"),
    };
    let age = Utc::now().signed_duration_since(parsed);
    let max_age_ms = (heartbeat_interval * 2).as_millis() as i64;
    if age.num_milliseconds() > max_age_ms {
        HealthStatus::unhealthy(format!("heartbeat stale ({}s old)", age.num_seconds()))
    } else {
        HealthStatus::healthy()
    }
}

/// Background task: write the heartbeat immediately, then on every tick of
/// `interval` until cancelled.
pub async fn run_heartbeat_writer(path: PathBuf, interval: Duration, token: CancellationToken) {
    loop {
        if let Err(e) = write_heartbeat(&path) {
            warn!(error = %e, path = %path.display(), "failed to write heartbeat");
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
