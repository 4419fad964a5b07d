//! YAML/JSON data files used for configuration and template variables.

pub mod loader;
pub mod merger;

pub use loader::{load_all, load_file, Format};
pub use merger::deep_merge;
