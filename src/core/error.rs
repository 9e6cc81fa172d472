use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire sync backend.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Manifest ────────────────────────────────────────
    #[error("Invalid manifest: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-256 mismatch for {path:?}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Security ────────────────────────────────────────
    #[error("Path escapes the installation directory: {path}")]
    PathEscape { path: String },

    // ── Locking ─────────────────────────────────────────
    #[error("Another sync holds the install lock at {path:?}")]
    LockContention { path: PathBuf },

    // ── Resources ───────────────────────────────────────
    #[error("Not enough free disk space: {available} bytes available, {required} required")]
    DiskSpace { available: u64, required: u64 },

    // ── Control flow ────────────────────────────────────
    #[error("Sync cancelled")]
    Cancelled,

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
