use std::path::Path;

use tracing::debug;

use crate::core::error::{SyncError, SyncResult};

/// Extracts a zip archive into `dest`, refusing hostile entry names.
///
/// Runs in two phases: every entry name is validated before the first
/// byte is written, so an archive carrying a traversal entry anywhere
/// leaves the destination untouched. Existing files are overwritten.
/// Returns the number of files written.
pub fn safe_extract(archive_path: &Path, dest: &Path) -> SyncResult<usize> {
    let file = std::fs::File::open(archive_path).map_err(|source| SyncError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let zipped = archive.by_index(index)?;
        let Some(enclosed) = zipped.enclosed_name() else {
            return Err(SyncError::PathEscape {
                path: zipped.name().to_string(),
            });
        };
        if !dest.join(&enclosed).starts_with(dest) {
            return Err(SyncError::PathEscape {
                path: zipped.name().to_string(),
            });
        }
    }

    std::fs::create_dir_all(dest).map_err(|source| SyncError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut written = 0usize;
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let Some(enclosed) = zipped.enclosed_name() else {
            return Err(SyncError::PathEscape {
                path: zipped.name().to_string(),
            });
        };
        let out_path = dest.join(enclosed);

        if zipped.name().ends_with('/') {
            std::fs::create_dir_all(&out_path).map_err(|source| SyncError::Io {
                path: out_path,
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SyncError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|source| SyncError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| SyncError::Io {
            path: out_path,
            source,
        })?;
        written += 1;
    }

    debug!(files = written, dest = %dest.display(), "archive extracted");
    Ok(written)
}
