// ─── CLI ───
// Thin caller layer: parse arguments, fetch the manifest, run the
// engine, render progress and errors.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::core::error::SyncResult;
use crate::core::hash;
use crate::core::http::build_http_client;
use crate::core::instance::InstanceLayout;
use crate::core::manifest::{Manifest, ManifestClient};
use crate::core::state::InstalledState;
use crate::core::sync::plan;
use crate::core::sync::{SyncConfig, SyncEngine, SyncObserver, SyncReport};

/// Top-level CLI entry point for the pack synchronization engine.
#[derive(Parser, Debug)]
#[command(
    name = "packsync",
    about = "Manifest-driven modpack synchronization engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synchronize an installation to a manifest
    Sync(SyncOpts),
    /// Verify an installation against a manifest without changing it
    Check(CheckOpts),
    /// Show what is currently installed
    Status(StatusOpts),
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SyncOpts {
    /// Manifest URL or local file path
    #[arg(short, long)]
    pub manifest: String,

    /// Instance directory (defaults to the platform data dir)
    #[arg(long)]
    pub instance_dir: Option<PathBuf>,

    /// Install subdirectory inside the instance directory
    #[arg(long)]
    pub install_subdir: Option<String>,

    /// Number of concurrent downloads
    #[arg(long, default_value_t = 1)]
    pub parallel: usize,

    /// Wait for a concurrent sync to finish instead of failing fast
    #[arg(long)]
    pub wait: bool,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Manifest URL or local file path
    #[arg(short, long)]
    pub manifest: String,

    /// Instance directory (defaults to the platform data dir)
    #[arg(long)]
    pub instance_dir: Option<PathBuf>,

    /// Install subdirectory inside the instance directory
    #[arg(long)]
    pub install_subdir: Option<String>,
}

/// Options for the `status` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Instance directory (defaults to the platform data dir)
    #[arg(long)]
    pub instance_dir: Option<PathBuf>,
}

// ── Handlers ────────────────────────────────────────────

pub async fn run_sync(opts: SyncOpts) -> SyncResult<()> {
    let layout = layout_for(opts.instance_dir, opts.install_subdir.as_deref())?;
    let manifest = load_manifest(&opts.manifest).await?;

    let engine = SyncEngine::new(SyncConfig {
        parallel_downloads: opts.parallel.max(1),
        wait_for_lock: opts.wait,
        ..SyncConfig::default()
    })?;

    let report = engine.sync(&layout, &manifest, &ConsoleObserver).await?;
    print_report(&report);
    Ok(())
}

pub async fn run_check(opts: CheckOpts) -> SyncResult<()> {
    let layout = layout_for(opts.instance_dir, opts.install_subdir.as_deref())?;
    let manifest = load_manifest(&opts.manifest).await?;
    let plan = plan::build_plan(&layout, &manifest)?;

    let mut ok = 0usize;
    let mut stale = 0usize;
    let mut missing = 0usize;
    for entry in &plan.files {
        if !entry.target.exists() {
            println!("missing  {}", entry.rel_path);
            missing += 1;
            continue;
        }
        let actual = hash::sha256_file(&entry.target).await?;
        if hash::hashes_match(&entry.sha256, &actual) {
            ok += 1;
        } else {
            println!("stale    {}", entry.rel_path);
            stale += 1;
        }
    }

    println!(
        "{} files checked: {ok} ok, {stale} stale, {missing} missing",
        plan.files.len()
    );
    Ok(())
}

pub async fn run_status(opts: StatusOpts) -> SyncResult<()> {
    let layout = layout_for(opts.instance_dir, None)?;
    match InstalledState::read(&layout).await? {
        Some(state) => println!(
            "Pack {} version {} installed at {}",
            state.pack_id,
            state.installed_pack_version,
            state.installed_at.to_rfc3339()
        ),
        None => println!("Never synced"),
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────

struct ConsoleObserver;

impl SyncObserver for ConsoleObserver {
    fn on_progress(&self, done: usize, total: usize) {
        println!("  [{done}/{total}]");
    }

    fn on_log(&self, message: &str) {
        println!("{message}");
    }
}

fn print_report(report: &SyncReport) {
    println!(
        "Pack {} now at version {}",
        report.pack_id, report.pack_version
    );
    println!("  downloaded:      {}", report.files_downloaded);
    println!("  up to date:      {}", report.files_skipped);
    println!("  orphans removed: {}", report.orphans_removed);
    if report.overrides_applied {
        println!("  overrides applied");
    }
}

fn layout_for(dir: Option<PathBuf>, subdir: Option<&str>) -> SyncResult<InstanceLayout> {
    let dir = dir.unwrap_or_else(default_instance_dir);
    let layout = InstanceLayout::new(dir);
    match subdir {
        Some(subdir) => layout.with_install_subdir(subdir),
        None => Ok(layout),
    }
}

fn default_instance_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packsync")
        .join("instance")
}

async fn load_manifest(source: &str) -> SyncResult<Manifest> {
    let client = ManifestClient::new(build_http_client()?);
    if source.contains("://") {
        client.fetch(source).await
    } else {
        client.load(Path::new(source)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_sync_with_manifest() {
        let cli = Cli::parse_from([
            "packsync",
            "sync",
            "--manifest",
            "https://packs.example.com/m.json",
        ]);
        match cli.command {
            Command::Sync(opts) => {
                assert_eq!(opts.manifest, "https://packs.example.com/m.json");
                assert_eq!(opts.parallel, 1);
                assert!(!opts.wait);
            }
            other => panic!("expected sync, got {other:?}"),
        }
    }

    #[test]
    fn parse_sync_options() {
        let cli = Cli::parse_from([
            "packsync",
            "sync",
            "-m",
            "pack.json",
            "--instance-dir",
            "/tmp/i",
            "--install-subdir",
            "game",
            "--parallel",
            "4",
            "--wait",
        ]);
        match cli.command {
            Command::Sync(opts) => {
                assert_eq!(opts.instance_dir, Some(PathBuf::from("/tmp/i")));
                assert_eq!(opts.install_subdir.as_deref(), Some("game"));
                assert_eq!(opts.parallel, 4);
                assert!(opts.wait);
            }
            other => panic!("expected sync, got {other:?}"),
        }
    }

    #[test]
    fn parse_status() {
        let cli = Cli::parse_from(["packsync", "status", "--instance-dir", "/tmp/i"]);
        assert!(matches!(cli.command, Command::Status(_)));
    }
}
