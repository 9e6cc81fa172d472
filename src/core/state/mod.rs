pub mod store;

pub use store::InstalledState;
