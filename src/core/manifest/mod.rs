pub mod fetch;
pub mod model;

pub use fetch::ManifestClient;
pub use model::{Download, FileEntry, Loader, Manifest, Overrides, Side};
