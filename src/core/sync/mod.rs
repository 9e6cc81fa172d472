pub mod engine;
pub mod plan;
pub mod progress;

pub use engine::{SyncConfig, SyncEngine};
pub use plan::{PlannedFile, SyncPlan};
pub use progress::{CancelToken, NullObserver, SyncObserver, SyncPhase, SyncReport};
