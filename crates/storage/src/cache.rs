use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use todoat_core::List;

/// The summary shape persisted in the cache file. Identical to
/// [`todoat_core::List`]; kept as its own name because the on-disk schema
/// (`CachedList`) is a contract independent of the in-memory
/// model evolving.
pub type CachedList = List;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error writing cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("serializing cache: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    created_at: i64,
    backend: String,
    lists: Vec<CachedList>,
}

/// Versioned on-disk cache of list summaries.
///
/// `path` is typically `$XDG_CACHE_HOME/todoat/lists.json`; callers
/// resolve that path via `todoat_core::config::cache_file()`.
pub struct ListCache {
    path: PathBuf,
    ttl: Duration,
}

impl ListCache {
    pub fn new(path: PathBuf, ttl: Duration) -> Self {
        Self { path, ttl }
    }

    /// Serve the cache if it parses, its `backend` matches `active_backend`,
    /// and it is within `ttl` of `now_epoch_ms`. Otherwise returns `None`
    /// (cache miss) — a corrupt file is deleted silently so the caller can
    /// regenerate it without surfacing an error.
    pub fn read(&self, active_backend: &str, now_epoch_ms: i64) -> Option<Vec<CachedList>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return None,
        };

        let file: CacheFile = match serde_json::from_str(&contents) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt list cache");
                let _ = std::fs::remove_file(&self.path);
                return None;
            }
        };

        if file.backend != active_backend {
            tracing::debug!(
                cached_backend = %file.backend,
                active_backend,
                "list cache backend mismatch, treating as miss"
            );
            return None;
        }

        let age_ms = now_epoch_ms.saturating_sub(file.created_at);
        if age_ms < 0 || age_ms as u64 > self.ttl.as_millis() as u64 {
            return None;
        }

        Some(file.lists)
    }

    /// Atomically rewrite the cache file: write to a sibling temp file,
    /// then rename over the target so concurrent readers never observe a
    /// partial write.
    pub fn write(
        &self,
        active_backend: &str,
        lists: &[CachedList],
        now_epoch_ms: i64,
    ) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = CacheFile {
            created_at: now_epoch_ms,
            backend: active_backend.to_string(),
            lists: lists.to_vec(),
        };
        let encoded = serde_json::to_vec_pretty(&file)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &encoded)?;
        set_world_readable_mode(&tmp_path)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Invalidate the cache outright. Any list mutation through the Task
    /// Manager interface calls this.
    pub fn invalidate(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn set_world_readable_mode(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_world_readable_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
