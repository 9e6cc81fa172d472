use std::io::ErrorKind;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{SyncError, SyncResult};
use crate::core::fsops;
use crate::core::instance::InstanceLayout;

/// Record of the last manifest version fully applied to an
/// installation. Absent until the first successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledState {
    pub pack_id: String,
    pub installed_pack_version: i64,
    pub installed_at: DateTime<Utc>,
}

impl InstalledState {
    /// Reads the installed state of an installation.
    ///
    /// A missing file is a fresh install, not an error. A file that no
    /// longer parses is treated the same way; the next successful sync
    /// rewrites it.
    pub async fn read(layout: &InstanceLayout) -> SyncResult<Option<InstalledState>> {
        let path = layout.state_file();
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SyncError::Io { path, source }),
        };

        match serde_json::from_str(&json) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Corrupt state.json at {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    /// Writes a fresh record with the current timestamp, atomically.
    ///
    /// This is the last operation of a successful sync; a crash before
    /// this call leaves the previous record in place and the next sync
    /// redoes the now hash-verified, cheap work.
    pub async fn write(
        layout: &InstanceLayout,
        pack_id: &str,
        pack_version: i64,
    ) -> SyncResult<InstalledState> {
        let state = InstalledState {
            pack_id: pack_id.to_string(),
            installed_pack_version: pack_version,
            installed_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        let target = layout.state_file();
        fsops::ensure_parent_dirs(&target).await?;
        let temp = layout
            .state_dir()
            .join(format!("state-{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp, json)
            .await
            .map_err(|source| SyncError::Io {
                path: temp.clone(),
                source,
            })?;
        fsops::atomic_replace(&temp, &target).await?;

        debug!(
            pack = pack_id,
            version = pack_version,
            "Installed state committed"
        );
        Ok(state)
    }
}
