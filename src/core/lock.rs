// ─── Install Lock ───
// At-most-one in-flight sync per installation.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};

/// Exclusive advisory lock over one installation.
///
/// Held for the whole sync attempt and released on drop, so every exit
/// path including panics gives the lock back. The lock file itself
/// stays behind; only the advisory lock is released.
#[derive(Debug)]
pub struct InstallLock {
    file: std::fs::File,
    path: PathBuf,
}

impl InstallLock {
    /// Takes the lock without waiting.
    ///
    /// A concurrent sync on the same installation surfaces as
    /// `LockContention`, which the caller may retry later.
    pub async fn try_acquire(path: &Path) -> SyncResult<InstallLock> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&path)?;
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("Install lock acquired at {:?}", path);
                    Ok(InstallLock { file, path })
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    Err(SyncError::LockContention { path })
                }
                Err(source) => Err(SyncError::Io { path, source }),
            }
        })
        .await
        .map_err(|e| SyncError::Other(format!("Task join error: {e}")))?
    }

    /// Takes the lock, waiting for any current holder to finish.
    pub async fn acquire(path: &Path) -> SyncResult<InstallLock> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&path)?;
            file.lock_exclusive().map_err(|source| SyncError::Io {
                path: path.clone(),
                source,
            })?;
            debug!("Install lock acquired at {:?}", path);
            Ok(InstallLock { file, path })
        })
        .await
        .map_err(|e| SyncError::Other(format!("Task join error: {e}")))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(source) = self.file.unlock() {
            warn!("Failed to unlock {:?}: {}", self.path, source);
        }
    }
}

fn open_lock_file(path: &Path) -> SyncResult<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SyncError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })
}
