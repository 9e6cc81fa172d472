// ─── Sync Planning ───
// Turns a validated manifest into resolved, containment-checked work.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::error::SyncResult;
use crate::core::fsops;
use crate::core::instance::InstanceLayout;
use crate::core::manifest::Manifest;

/// One client-relevant file with its resolved target and source.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub rel_path: String,
    pub target: PathBuf,
    pub url: String,
    pub sha256: String,
}

/// The overrides archive with its resolved source URL.
#[derive(Debug, Clone)]
pub struct PlannedOverrides {
    pub url: String,
    pub sha256: String,
}

/// Everything one sync attempt will do, resolved up front.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub files: Vec<PlannedFile>,
    pub overrides: Option<PlannedOverrides>,
    /// Resolved targets, for orphan detection.
    pub targets: HashSet<PathBuf>,
}

impl SyncPlan {
    /// Fixed progress total for the attempt: one step per file plus
    /// one for the overrides archive when declared.
    pub fn total_steps(&self) -> usize {
        self.files.len() + usize::from(self.overrides.is_some())
    }
}

/// Builds the plan for a manifest against an installation layout.
///
/// Filters to client-relevant entries in manifest order and resolves
/// every target path before the engine mutates anything, so a hostile
/// path anywhere in the manifest aborts the attempt with the
/// filesystem untouched.
pub fn build_plan(layout: &InstanceLayout, manifest: &Manifest) -> SyncResult<SyncPlan> {
    let install_dir = layout.install_dir();

    let mut files = Vec::new();
    let mut targets = HashSet::new();
    for entry in &manifest.files {
        if !entry.side.is_client_relevant() {
            continue;
        }
        let target = fsops::resolve_under(&install_dir, &entry.path)?;
        targets.insert(target.clone());
        files.push(PlannedFile {
            rel_path: entry.path.clone(),
            target,
            url: manifest.resolve_url(&entry.download.url),
            sha256: entry.sha256.clone(),
        });
    }

    let overrides = manifest
        .overrides
        .as_ref()
        .map(|overrides| PlannedOverrides {
            url: manifest.resolve_url(&overrides.url),
            sha256: overrides.sha256.clone(),
        });

    Ok(SyncPlan {
        files,
        overrides,
        targets,
    })
}
