// ─── Manifest Retrieval ───
// Fetches and parses the pack manifest from a URL or a local file.

use std::path::Path;

use tracing::info;

use crate::core::error::{SyncError, SyncResult};

use super::model::Manifest;

/// Retrieves pack manifests using a shared HTTP client.
pub struct ManifestClient {
    client: reqwest::Client,
}

impl ManifestClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the manifest from a remote URL.
    ///
    /// No retry logic lives here; retries are a caller concern.
    pub async fn fetch(&self, url: &str) -> SyncResult<Manifest> {
        info!(url, "Fetching pack manifest");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        let manifest = Self::parse(&bytes)?;
        info!(
            pack = %manifest.pack_id,
            version = manifest.pack_version,
            files = manifest.files.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    /// Load a manifest from a local file, for packs staged on disk.
    pub async fn load(&self, path: &Path) -> SyncResult<Manifest> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SyncError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&bytes)
    }

    fn parse(bytes: &[u8]) -> SyncResult<Manifest> {
        let manifest: Manifest = serde_json::from_slice(bytes)
            .map_err(|e| SyncError::Format(format!("manifest does not parse: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;
    use crate::core::testserver::TestServer;

    const MINIMAL: &str = r#"{
        "packId": "p", "packVersion": 3, "baseUrl": "https://x",
        "files": []
    }"#;

    #[test]
    fn parse_rejects_malformed_json() {
        let err = ManifestClient::parse(b"{not json").unwrap_err();
        assert!(matches!(err, SyncError::Format(_)));
    }

    #[test]
    fn parse_rejects_missing_pack_id() {
        let err = ManifestClient::parse(br#"{"packVersion": 1, "baseUrl": "x", "files": []}"#)
            .unwrap_err();
        assert!(matches!(err, SyncError::Format(_)));
    }

    #[tokio::test]
    async fn loads_manifest_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        tokio::fs::write(&path, MINIMAL).await.unwrap();

        let client = ManifestClient::new(build_http_client().unwrap());
        let manifest = client.load(&path).await.unwrap();
        assert_eq!(manifest.pack_id, "p");
        assert_eq!(manifest.pack_version, 3);
    }

    #[tokio::test]
    async fn fetches_manifest_over_http() {
        let server = TestServer::start().await;
        server.add_route("/manifest.json", 200, MINIMAL.as_bytes().to_vec());

        let client = ManifestClient::new(build_http_client().unwrap());
        let manifest = client.fetch(&server.url("/manifest.json")).await.unwrap();
        assert_eq!(manifest.pack_id, "p");
    }

    #[tokio::test]
    async fn non_success_status_is_a_download_failure() {
        let server = TestServer::start().await;

        let client = ManifestClient::new(build_http_client().unwrap());
        let err = client.fetch(&server.url("/missing.json")).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::DownloadFailed { status: 404, .. }
        ));
    }
}
