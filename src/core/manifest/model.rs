// ─── Pack Manifest ───
// Wire model for the remote pack manifest document.

use serde::Deserialize;

use crate::core::error::{SyncError, SyncResult};

/// Top-level pack manifest, fetched fresh for every sync attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub pack_id: String,
    #[serde(default)]
    pub pack_name: String,
    pub pack_version: i64,
    #[serde(default)]
    pub minecraft: String,
    #[serde(default)]
    pub loader: Option<Loader>,
    pub base_url: String,
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub overrides: Option<Overrides>,
}

/// Mod-loader metadata. Passed through to callers, never interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct Loader {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

/// A single managed file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub download: Download,
}

/// Which side of the game a file belongs to. Absent means both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
    #[default]
    Both,
}

impl Side {
    /// Server-only entries are invisible to the client sync.
    pub fn is_client_relevant(self) -> bool {
        matches!(self, Side::Client | Side::Both)
    }
}

/// Download descriptor for a file entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Download {
    #[serde(rename = "type", default = "default_download_kind")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

impl Default for Download {
    fn default() -> Self {
        Download {
            kind: default_download_kind(),
            url: String::new(),
        }
    }
}

fn default_download_kind() -> String {
    "url".to_string()
}

/// The shared overrides archive applied on top of the install tree.
#[derive(Debug, Clone, Deserialize)]
pub struct Overrides {
    pub url: String,
    pub sha256: String,
}

impl Manifest {
    /// Structural validation, run before the engine touches the
    /// filesystem. Identity must be present, every entry needs a path,
    /// and every client-relevant entry needs a hash and a source URL.
    pub fn validate(&self) -> SyncResult<()> {
        if self.pack_id.trim().is_empty() {
            return Err(SyncError::Format("packId is blank".to_string()));
        }
        for (index, entry) in self.files.iter().enumerate() {
            if entry.path.trim().is_empty() {
                return Err(SyncError::Format(format!(
                    "files[{index}] has a blank path"
                )));
            }
            if entry.side.is_client_relevant() {
                if entry.sha256.trim().is_empty() {
                    return Err(SyncError::Format(format!(
                        "files[{index}] ({}) has a blank sha256",
                        entry.path
                    )));
                }
                if entry.download.url.trim().is_empty() {
                    return Err(SyncError::Format(format!(
                        "files[{index}] ({}) has a blank download url",
                        entry.path
                    )));
                }
            }
        }
        if let Some(overrides) = &self.overrides {
            if overrides.url.trim().is_empty() || overrides.sha256.trim().is_empty() {
                return Err(SyncError::Format(
                    "overrides must carry a url and sha256".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolves a possibly-relative download URL against `baseUrl`.
    pub fn resolve_url(&self, raw: &str) -> String {
        if raw.contains("://") {
            return raw.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_manifest_json() -> &'static str {
        r#"{
            "packId": "alpha-pack",
            "packName": "Alpha Pack",
            "packVersion": 7,
            "minecraft": "1.20.4",
            "loader": {"type": "fabric", "version": "0.15.3"},
            "baseUrl": "https://packs.example.com/alpha",
            "files": [
                {
                    "path": "mods/a.jar",
                    "sha256": "AA11",
                    "size": 1024,
                    "side": "client",
                    "download": {"type": "url", "url": "mods/a.jar"}
                },
                {
                    "path": "mods/server-only.jar",
                    "sha256": "BB22",
                    "size": 2048,
                    "side": "server",
                    "download": {"type": "url", "url": "https://cdn.example.com/s.jar"}
                }
            ],
            "overrides": {"url": "overrides.zip", "sha256": "CC33"}
        }"#
    }

    #[test]
    fn deserializes_full_document() {
        let manifest: Manifest = serde_json::from_str(full_manifest_json()).unwrap();
        assert_eq!(manifest.pack_id, "alpha-pack");
        assert_eq!(manifest.pack_version, 7);
        assert_eq!(manifest.minecraft, "1.20.4");
        assert_eq!(manifest.loader.as_ref().unwrap().kind, "fabric");
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files[0].side, Side::Client);
        assert_eq!(manifest.files[1].side, Side::Server);
        assert_eq!(manifest.overrides.as_ref().unwrap().sha256, "CC33");
        manifest.validate().unwrap();
    }

    #[test]
    fn absent_side_defaults_to_both() {
        let json = r#"{
            "packId": "p", "packVersion": 1, "baseUrl": "https://x",
            "files": [{"path": "mods/a.jar", "sha256": "aa",
                       "download": {"url": "https://x/a.jar"}}]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.files[0].side, Side::Both);
        assert!(manifest.files[0].side.is_client_relevant());
        assert_eq!(manifest.files[0].download.kind, "url");
    }

    #[test]
    fn validation_rejects_blank_identity_and_fields() {
        let mut manifest: Manifest = serde_json::from_str(full_manifest_json()).unwrap();
        manifest.pack_id = "  ".to_string();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            SyncError::Format(_)
        ));

        let mut manifest: Manifest = serde_json::from_str(full_manifest_json()).unwrap();
        manifest.files[0].sha256 = String::new();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            SyncError::Format(_)
        ));

        let mut manifest: Manifest = serde_json::from_str(full_manifest_json()).unwrap();
        manifest.files[0].download.url = String::new();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            SyncError::Format(_)
        ));
    }

    #[test]
    fn server_only_entries_may_omit_download_details() {
        let json = r#"{
            "packId": "p", "packVersion": 1, "baseUrl": "https://x",
            "files": [{"path": "mods/server.jar", "side": "server"}]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        manifest.validate().unwrap();
        assert!(!manifest.files[0].side.is_client_relevant());
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let manifest: Manifest = serde_json::from_str(full_manifest_json()).unwrap();
        assert_eq!(
            manifest.resolve_url("mods/a.jar"),
            "https://packs.example.com/alpha/mods/a.jar"
        );
        assert_eq!(
            manifest.resolve_url("/mods/a.jar"),
            "https://packs.example.com/alpha/mods/a.jar"
        );
        assert_eq!(
            manifest.resolve_url("https://cdn.example.com/s.jar"),
            "https://cdn.example.com/s.jar"
        );
    }
}
