//! Diagnostic logging: a leveled logger built on `tracing`, not a
//! hand-rolled print logger. DEBUG lines get an `HH:MM:SS` prefix;
//! INFO/WARN/ERROR get a bare `[LEVEL]` prefix; everything goes to stderr.
//! A second, independent sink ("the background logger") writes
//! line-oriented entries to a per-user log file and degrades to a discard
//! sink when `logging.background_enabled` is false.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::pidfile::set_owner_only_mode;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Toggle DEBUG-level output at runtime.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::SeqCst);
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

struct LevelPrefixFormat;

impl<S, N> FormatEvent<S, N> for LevelPrefixFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &tracing::Event<'_>) -> fmt::Result {
        match *event.metadata().level() {
            Level::TRACE | Level::DEBUG => {
                write!(writer, "{} ", chrono::Local::now().format("%H:%M:%S"))?;
            }
            Level::INFO => write!(writer, "[INFO] ")?,
            Level::WARN => write!(writer, "[WARN] ")?,
            Level::ERROR => write!(writer, "[ERROR] ")?,
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the process-wide console subscriber. Safe to call once per
/// process; subsequent calls are no-ops (matches `tracing_subscriber`'s own
/// `try_init` semantics, surfaced here as an infallible convenience).
pub fn init_console_logging(verbose_default: bool) {
    set_verbose(verbose_default);
    let filter = if verbose_default {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::new("info")
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .event_format(LevelPrefixFormat)
        .with_env_filter(filter)
        .try_init();
}

/// The per-process background file logger: an `mpsc`-channel-fed writer
/// task. When disabled it degrades to a discard sink rather than raising
/// errors.
pub struct BackgroundLogger {
    tx: Option<UnboundedSender<String>>,
}

impl BackgroundLogger {
    pub fn spawn(path: PathBuf, enabled: bool) -> Self {
        if !enabled {
            return Self { tx: None };
        }
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path, rx));
        Self { tx: Some(tx) }
    }

    pub fn log(&self, line: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(line.into());
        }
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<String>) {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::error!(error = %e, "failed to create background log directory");
            return;
        }
    }
    let file = match tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "failed to open background log file");
            return;
        }
    };
    if let Err(e) = set_owner_only_mode(&path) {
        tracing::warn!(error = %e, "failed to set background log file permissions");
    }

    let mut writer = tokio::io::BufWriter::new(file);
    while let Some(line) = rx.recv().await {
        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
        let _ = writer.write_all(b"\n").await;
        let _ = writer.flush().await;
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
