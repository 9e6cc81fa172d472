pub mod cli;
pub mod core;

pub use crate::core::error::{SyncError, SyncResult};
pub use crate::core::instance::InstanceLayout;
pub use crate::core::manifest::{Manifest, ManifestClient};
pub use crate::core::state::InstalledState;
pub use crate::core::sync::{
    CancelToken, NullObserver, SyncConfig, SyncEngine, SyncObserver, SyncReport,
};
