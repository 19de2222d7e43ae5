//! Cross-process advisory lock on a library's cache directory.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::Result;

/// Default time to wait for another process to release the cache.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Held exclusive lock. Released when dropped.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Try to take the lock at `path` for at most `timeout`.
    ///
    /// Returns `Ok(None)` when another holder kept it for the whole timeout.
    /// The lock file is created, along with its parent directory, if missing.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::trace!("Locked {}", path.display());
                    return Ok(Some(Self {
                        file,
                        path: path.to_path_buf(),
                    }));
                }
                Err(e) if is_contended(&e) => {
                    if start.elapsed() >= timeout {
                        tracing::debug!("Gave up waiting for {} after {timeout:?}", path.display());
                        return Ok(None);
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed())));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {e}", self.path.display());
        }
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
