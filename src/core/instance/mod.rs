pub mod layout;

pub use layout::InstanceLayout;
