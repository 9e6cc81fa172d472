use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{SyncError, SyncResult};

pub mod extract;

pub use extract::safe_extract;

/// Creates the parent directory chain of `path`. Idempotent.
pub async fn ensure_parent_dirs(path: &Path) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| SyncError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Lexically normalizes a manifest-declared relative path.
///
/// Accepts `/` and `\` as separators, drops `.` segments, resolves `..`
/// segments that stay inside the root. Absolute paths, drive prefixes,
/// climbs above the root, and paths that normalize to nothing are all
/// rejected so no caller can be steered outside its installation
/// directory.
pub fn sanitize_rel_path(raw: &str) -> SyncResult<PathBuf> {
    let escape = || SyncError::PathEscape {
        path: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(escape());
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(escape());
    }
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return Err(escape());
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in trimmed.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(escape());
                }
            }
            normal => parts.push(normal),
        }
    }

    if parts.is_empty() {
        return Err(escape());
    }

    Ok(parts.iter().collect())
}

/// Resolves a manifest path under `root`, guaranteeing containment.
pub fn resolve_under(root: &Path, raw: &str) -> SyncResult<PathBuf> {
    let resolved = root.join(sanitize_rel_path(raw)?);
    if !resolved.starts_with(root) {
        return Err(SyncError::PathEscape {
            path: raw.to_string(),
        });
    }
    Ok(resolved)
}

/// Moves `temp` into place at `target`, replacing any previous file.
///
/// A plain rename when source and target share a volume. Crossing
/// volumes falls back to copy-then-delete, which leaves a short
/// non-atomic window. Platforms that refuse to rename onto an existing
/// file get the existing file removed first.
pub async fn atomic_replace(temp: &Path, target: &Path) -> SyncResult<()> {
    ensure_parent_dirs(target).await?;

    match rename_or_copy(temp, target).await {
        Ok(()) => Ok(()),
        Err(SyncError::Io { source, .. })
            if target.exists()
                && matches!(
                    source.kind(),
                    ErrorKind::AlreadyExists | ErrorKind::PermissionDenied
                ) =>
        {
            debug!(target = %target.display(), "replacing existing file via remove + rename");
            tokio::fs::remove_file(target)
                .await
                .map_err(|source| SyncError::Io {
                    path: target.to_path_buf(),
                    source,
                })?;
            rename_or_copy(temp, target).await
        }
        Err(err) => Err(err),
    }
}

async fn rename_or_copy(temp: &Path, target: &Path) -> SyncResult<()> {
    match tokio::fs::rename(temp, target).await {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == ErrorKind::CrossesDevices => {
            debug!(target = %target.display(), "rename crossed volumes, copying instead");
            tokio::fs::copy(temp, target)
                .await
                .map_err(|source| SyncError::Io {
                    path: target.to_path_buf(),
                    source,
                })?;
            tokio::fs::remove_file(temp)
                .await
                .map_err(|source| SyncError::Io {
                    path: temp.to_path_buf(),
                    source,
                })?;
            Ok(())
        }
        Err(source) => Err(SyncError::Io {
            path: target.to_path_buf(),
            source,
        }),
    }
}

/// Removes a file, treating an already-missing file as success.
pub async fn remove_file_if_exists(path: &Path) -> SyncResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SyncError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Recursively deletes a directory tree. A missing root is fine.
pub async fn delete_tree(root: &Path) -> SyncResult<()> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || match std::fs::remove_dir_all(&root) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SyncError::Io { path: root, source }),
    })
    .await
    .map_err(|e| SyncError::Other(format!("Task join error: {e}")))?
}
