use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{SyncError, SyncResult};
use crate::core::fsops;
use crate::core::hash;

/// Streaming, SHA-256 verified downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, streaming chunks to disk.
    ///
    /// Creates parent directories as needed. Drops the file handle
    /// immediately after writing so a following rename never sees an
    /// open file. Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> SyncResult<u64> {
        fsops::ensure_parent_dirs(dest).await?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        {
            let mut file =
                tokio::fs::File::create(dest)
                    .await
                    .map_err(|source| SyncError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|source| SyncError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(|source| SyncError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
            // file is dropped here, before any rename sees it
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }

    /// Download a file and verify it against an expected SHA-256.
    ///
    /// On mismatch the artifact is deleted before the error
    /// propagates, so corrupt bytes never outlive the attempt.
    pub async fn download_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: &str,
    ) -> SyncResult<u64> {
        let written = self.download_to(url, dest).await?;

        let actual = hash::sha256_file(dest).await?;
        if !hash::hashes_match(expected_sha256, &actual) {
            fsops::remove_file_if_exists(dest).await?;
            return Err(SyncError::IntegrityMismatch {
                path: dest.to_path_buf(),
                expected: expected_sha256.to_string(),
                actual,
            });
        }
        Ok(written)
    }
}
