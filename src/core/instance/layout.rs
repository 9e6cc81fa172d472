use std::path::{Path, PathBuf};

use crate::core::error::{SyncError, SyncResult};
use crate::core::fsops;

const STATE_DIR: &str = ".state";
const STATE_FILE: &str = "state.json";
const LOCK_FILE: &str = "install.lock";
const DOWNLOADS_DIR: &str = "downloads";
const DEFAULT_INSTALL_SUBDIR: &str = "minecraft";

/// On-disk layout of one managed installation.
///
/// Each installation lives in its own folder with:
/// - `.state/state.json`   — installed-state record
/// - `.state/install.lock` — exclusive sync lock
/// - `downloads/`          — scratch area, never holds committed files
/// - `minecraft/`          — the install root the manifest describes
#[derive(Debug, Clone)]
pub struct InstanceLayout {
    instance_dir: PathBuf,
    install_subdir: PathBuf,
}

impl InstanceLayout {
    pub fn new(instance_dir: impl Into<PathBuf>) -> Self {
        Self {
            instance_dir: instance_dir.into(),
            install_subdir: PathBuf::from(DEFAULT_INSTALL_SUBDIR),
        }
    }

    /// Overrides the install root with a custom subdirectory of the
    /// instance folder. The subdirectory must stay inside it.
    pub fn with_install_subdir(mut self, subdir: &str) -> SyncResult<Self> {
        self.install_subdir = fsops::sanitize_rel_path(subdir)?;
        Ok(self)
    }

    pub fn instance_dir(&self) -> &Path {
        &self.instance_dir
    }

    /// Path to the `.state/` bookkeeping directory.
    pub fn state_dir(&self) -> PathBuf {
        self.instance_dir.join(STATE_DIR)
    }

    /// Path to the installed-state record.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    /// Path to the exclusive install lock file.
    pub fn lock_file(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    /// Path to the scratch area for in-flight downloads.
    pub fn downloads_dir(&self) -> PathBuf {
        self.instance_dir.join(DOWNLOADS_DIR)
    }

    /// Path to the install root the manifest describes.
    pub fn install_dir(&self) -> PathBuf {
        self.instance_dir.join(&self.install_subdir)
    }

    /// Path to the `mods/` directory, the only orphan-cleanup target.
    pub fn mods_dir(&self) -> PathBuf {
        self.install_dir().join("mods")
    }

    /// Creates the bookkeeping, scratch, and install directories.
    pub async fn prepare(&self) -> SyncResult<()> {
        for dir in [self.state_dir(), self.downloads_dir(), self.install_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| SyncError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_hang_off_instance_dir() {
        let layout = InstanceLayout::new("/data/instances/alpha");
        let base = Path::new("/data/instances/alpha");
        assert_eq!(layout.state_file(), base.join(".state").join("state.json"));
        assert_eq!(
            layout.lock_file(),
            base.join(".state").join("install.lock")
        );
        assert_eq!(layout.downloads_dir(), base.join("downloads"));
        assert_eq!(layout.install_dir(), base.join("minecraft"));
        assert_eq!(layout.mods_dir(), base.join("minecraft").join("mods"));
    }

    #[test]
    fn custom_install_subdir_is_sanitized() {
        let layout = InstanceLayout::new("/data/i")
            .with_install_subdir("game/files")
            .unwrap();
        assert_eq!(
            layout.install_dir(),
            Path::new("/data/i").join("game").join("files")
        );

        let err = InstanceLayout::new("/data/i")
            .with_install_subdir("../outside")
            .unwrap_err();
        assert!(matches!(err, SyncError::PathEscape { .. }));
    }

    #[tokio::test]
    async fn prepare_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = InstanceLayout::new(dir.path());
        layout.prepare().await.unwrap();

        assert!(layout.state_dir().is_dir());
        assert!(layout.downloads_dir().is_dir());
        assert!(layout.install_dir().is_dir());
    }
}
