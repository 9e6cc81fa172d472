// ─── Synchronization Engine ───
// Drives one installation from whatever is on disk to the state a
// manifest declares, atomically per file, under an exclusive lock.

use std::path::Path;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::core::downloader::Downloader;
use crate::core::error::{SyncError, SyncResult};
use crate::core::fsops;
use crate::core::hash;
use crate::core::http::build_http_client;
use crate::core::instance::InstanceLayout;
use crate::core::lock::InstallLock;
use crate::core::manifest::Manifest;
use crate::core::state::InstalledState;

use super::plan::{self, PlannedFile, PlannedOverrides, SyncPlan};
use super::progress::{CancelToken, ProgressCounter, SyncObserver, SyncPhase, SyncReport};

const MIN_FREE_DISK_BYTES: u64 = 512 * 1024 * 1024;

/// Tunables for one engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Entries transferred at once. 1 keeps strict manifest order.
    pub parallel_downloads: usize,
    /// Free-space floor checked before transfers start. 0 disables.
    pub min_free_disk_bytes: u64,
    /// Wait for a concurrent sync to finish instead of failing fast.
    pub wait_for_lock: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            parallel_downloads: 1,
            min_free_disk_bytes: MIN_FREE_DISK_BYTES,
            wait_for_lock: false,
        }
    }
}

/// The orchestrator. One engine drives one sync attempt at a time;
/// the per-installation lock serializes attempts across processes.
pub struct SyncEngine {
    config: SyncConfig,
    downloader: Downloader,
    cancel: CancelToken,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let client = build_http_client()?;
        Ok(Self {
            config,
            downloader: Downloader::new(client),
            cancel: CancelToken::new(),
        })
    }

    /// Token that cancels this engine's in-flight sync. Cancellation
    /// is cooperative and takes effect between entries.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs one full sync attempt.
    ///
    /// Fails fast with `LockContention` when another sync holds the
    /// installation. On any error the installation keeps every file
    /// committed so far and its previous installed-state record; the
    /// lock is released on every path.
    #[instrument(skip(self, layout, manifest, observer), fields(pack = %manifest.pack_id))]
    pub async fn sync(
        &self,
        layout: &InstanceLayout,
        manifest: &Manifest,
        observer: &dyn SyncObserver,
    ) -> SyncResult<SyncReport> {
        manifest.validate()?;
        let started_at = Utc::now();

        info!(
            phase = SyncPhase::LockAcquired.as_str(),
            "Acquiring install lock"
        );
        let _lock = if self.config.wait_for_lock {
            InstallLock::acquire(&layout.lock_file()).await?
        } else {
            InstallLock::try_acquire(&layout.lock_file()).await?
        };

        match self
            .run_locked(layout, manifest, observer, started_at)
            .await
        {
            Ok(report) => {
                info!(
                    phase = SyncPhase::Done.as_str(),
                    downloaded = report.files_downloaded,
                    skipped = report.files_skipped,
                    orphans = report.orphans_removed,
                    "Sync finished"
                );
                Ok(report)
            }
            Err(err) => {
                warn!("Sync aborted: {err}");
                Err(err)
            }
        }
    }

    async fn run_locked(
        &self,
        layout: &InstanceLayout,
        manifest: &Manifest,
        observer: &dyn SyncObserver,
        started_at: DateTime<Utc>,
    ) -> SyncResult<SyncReport> {
        info!(
            phase = SyncPhase::Diffing.as_str(),
            files = manifest.files.len(),
            "Planning sync"
        );
        observer.on_log("Planning sync");
        let plan = plan::build_plan(layout, manifest)?;
        self.check_cancelled()?;
        if self.config.min_free_disk_bytes > 0 {
            ensure_min_disk_space(layout.instance_dir(), self.config.min_free_disk_bytes)?;
        }

        // Drop leftovers from crashed or cancelled runs, then rebuild
        // the scratch area.
        fsops::delete_tree(&layout.downloads_dir()).await?;
        layout.prepare().await?;

        let progress = ProgressCounter::new(plan.total_steps(), observer);

        info!(
            phase = SyncPhase::Transferring.as_str(),
            planned = plan.files.len(),
            "Transferring files"
        );
        let (files_downloaded, files_skipped) = if self.config.parallel_downloads > 1 {
            self.transfer_parallel(layout, &plan, observer, &progress)
                .await?
        } else {
            self.transfer_sequential(layout, &plan, observer, &progress)
                .await?
        };

        info!(
            phase = SyncPhase::CleaningOrphans.as_str(),
            "Cleaning orphaned mods"
        );
        let orphans_removed = clean_orphans(layout, &plan).await?;

        let overrides_applied = match &plan.overrides {
            Some(overrides) => {
                self.check_cancelled()?;
                info!(
                    phase = SyncPhase::ApplyingOverrides.as_str(),
                    "Applying overrides archive"
                );
                self.apply_overrides(layout, overrides, observer).await?;
                progress.tick().await;
                true
            }
            None => false,
        };

        info!(
            phase = SyncPhase::CommittingState.as_str(),
            "Committing installed state"
        );
        InstalledState::write(layout, &manifest.pack_id, manifest.pack_version).await?;

        fsops::delete_tree(&layout.downloads_dir()).await?;

        Ok(SyncReport {
            pack_id: manifest.pack_id.clone(),
            pack_version: manifest.pack_version,
            files_total: plan.files.len(),
            files_downloaded,
            files_skipped,
            orphans_removed,
            overrides_applied,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn transfer_sequential(
        &self,
        layout: &InstanceLayout,
        plan: &SyncPlan,
        observer: &dyn SyncObserver,
        progress: &ProgressCounter<'_>,
    ) -> SyncResult<(usize, usize)> {
        let mut downloaded = 0usize;
        let mut skipped = 0usize;
        for entry in &plan.files {
            self.check_cancelled()?;
            if self.sync_entry(layout, entry, observer).await? {
                downloaded += 1;
            } else {
                skipped += 1;
            }
            progress.tick().await;
        }
        Ok((downloaded, skipped))
    }

    async fn transfer_parallel(
        &self,
        layout: &InstanceLayout,
        plan: &SyncPlan,
        observer: &dyn SyncObserver,
        progress: &ProgressCounter<'_>,
    ) -> SyncResult<(usize, usize)> {
        info!(
            concurrency = self.config.parallel_downloads,
            "Parallel transfer enabled"
        );
        let mut results = futures_util::stream::iter(plan.files.iter())
            .map(|entry| async move {
                self.check_cancelled()?;
                let fetched = self.sync_entry(layout, entry, observer).await?;
                progress.tick().await;
                Ok::<bool, SyncError>(fetched)
            })
            .buffer_unordered(self.config.parallel_downloads);

        let mut downloaded = 0usize;
        let mut skipped = 0usize;
        while let Some(result) = results.next().await {
            if result? {
                downloaded += 1;
            } else {
                skipped += 1;
            }
        }
        Ok((downloaded, skipped))
    }

    /// Brings one entry up to date. Returns true when bytes moved,
    /// false when the local copy already matched.
    async fn sync_entry(
        &self,
        layout: &InstanceLayout,
        entry: &PlannedFile,
        observer: &dyn SyncObserver,
    ) -> SyncResult<bool> {
        if entry.target.exists() {
            let actual = hash::sha256_file(&entry.target).await?;
            if hash::hashes_match(&entry.sha256, &actual) {
                debug!("Up to date: {}", entry.rel_path);
                return Ok(false);
            }
        }

        observer.on_log(&format!("Downloading {}", entry.rel_path));
        let temp = layout
            .downloads_dir()
            .join(format!("{}.part", Uuid::new_v4()));
        self.downloader
            .download_verified(&entry.url, &temp, &entry.sha256)
            .await?;
        fsops::atomic_replace(&temp, &entry.target).await?;
        debug!("Committed: {}", entry.rel_path);
        Ok(true)
    }

    async fn apply_overrides(
        &self,
        layout: &InstanceLayout,
        overrides: &PlannedOverrides,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        observer.on_log("Applying overrides archive");
        let archive = layout
            .downloads_dir()
            .join(format!("{}.zip", Uuid::new_v4()));
        self.downloader
            .download_verified(&overrides.url, &archive, &overrides.sha256)
            .await?;

        let archive_for_extract = archive.clone();
        let install_dir = layout.install_dir();
        let written = tokio::task::spawn_blocking(move || {
            fsops::safe_extract(&archive_for_extract, &install_dir)
        })
        .await
        .map_err(|e| SyncError::Other(format!("Task join error: {e}")))??;

        fsops::remove_file_if_exists(&archive).await?;
        info!(files = written, "Overrides applied");
        Ok(())
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

/// Deletes undeclared `*.jar` files directly under `mods/`.
///
/// Directories, non-jar files, and anything outside `mods/` are never
/// touched, whatever the manifest says.
async fn clean_orphans(layout: &InstanceLayout, plan: &SyncPlan) -> SyncResult<usize> {
    let mods_dir = layout.mods_dir();
    if !mods_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0usize;
    let mut entries = tokio::fs::read_dir(&mods_dir)
        .await
        .map_err(|source| SyncError::Io {
            path: mods_dir.clone(),
            source,
        })?;
    while let Some(entry) = entries.next_entry().await.map_err(|source| SyncError::Io {
        path: mods_dir.clone(),
        source,
    })? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|source| SyncError::Io {
            path: path.clone(),
            source,
        })?;
        if !file_type.is_file() {
            continue;
        }
        let is_jar = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("jar"))
            .unwrap_or(false);
        if !is_jar || plan.targets.contains(&path) {
            continue;
        }

        info!("Removing orphaned mod {:?}", entry.file_name());
        fsops::remove_file_if_exists(&path).await?;
        removed += 1;
    }
    Ok(removed)
}

fn ensure_min_disk_space(path: &Path, minimum_bytes: u64) -> SyncResult<()> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut best_len = 0usize;
    let mut available = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let len = mount.as_os_str().len();
            if len >= best_len {
                best_len = len;
                available = Some(disk.available_space());
            }
        }
    }
    if let Some(bytes) = available {
        if bytes < minimum_bytes {
            return Err(SyncError::DiskSpace {
                available: bytes,
                required: minimum_bytes,
            });
        }
    }
    Ok(())
}
