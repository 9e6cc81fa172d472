use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::core::error::{SyncError, SyncResult};

const HASH_BUF_BYTES: usize = 64 * 1024;

/// Computes the SHA-256 digest of a file as lowercase hex.
///
/// Reads in fixed-size chunks so mod jars and override archives never
/// have to fit in memory.
pub async fn sha256_file(path: &Path) -> SyncResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_BYTES];
    loop {
        let read = file
            .read(&mut buf)
            .await
            .map_err(|source| SyncError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Case-insensitive digest comparison; manifest hashes arrive in
/// whatever case the pack author's tooling emitted.
pub fn hashes_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
