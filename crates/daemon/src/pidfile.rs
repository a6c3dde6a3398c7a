use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::DaemonError;

/// Guards the daemon's PID file for the lifetime of the process holding it.
/// Dropping this does not remove the file — removal happens through the
/// shutdown kernel's cleanup registry so it runs at the right point in the
/// LIFO teardown order. The open `File` is kept alive for the guard's
/// lifetime: the advisory lock it holds is released as soon as the
/// descriptor closes, so dropping it early would defeat the guard.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    #[allow(dead_code)]
    file: std::fs::File,
}

impl PidFile {
    /// Create and lock the PID file, failing if a live process already
    /// holds it. The open-then-lock is a single atomic step via
    /// `try_lock_exclusive`, closing the liveness-check-then-write race a
    /// plain `create_new` open would still leave between two daemons
    /// starting at once. A stale file — unreadable contents, a PID that is
    /// not running, or a lock nobody currently holds — is silently
    /// reclaimed.
    pub fn acquire(path: &Path) -> Result<Self, DaemonError> {
        let mut file = std::fs::OpenOptions::new().read(true).write(true).create(true).open(path)?;
        set_owner_only_mode(path)?;

        if file.try_lock_exclusive().is_err() {
            let existing = read_pid(path);
            return Err(DaemonError::AlreadyRunning(existing.unwrap_or(0)));
        }

        file.set_len(0)?;
        file.seek(std::io::SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(unix)]
pub(crate) fn set_owner_only_mode(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
pub(crate) fn set_owner_only_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
