// ─── Packsync Core ───
// Manifest-driven synchronization and atomic installation engine.
//
// Architecture:
//   core/
//     manifest/   — Pack manifest model + fetcher
//     instance/   — On-disk installation layout
//     state/      — Installed-state record store
//     downloader/ — Streaming downloads with SHA-256 validation
//     fsops/      — Atomic replace, safe extraction, path containment
//     sync/       — The synchronization engine

pub mod downloader;
pub mod error;
pub mod fsops;
pub mod hash;
pub mod http;
pub mod instance;
pub mod lock;
pub mod manifest;
pub mod state;
pub mod sync;

#[cfg(test)]
pub mod testserver;
