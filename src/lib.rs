//! Template rendering for web applications.
//!
//! [`Templates`] loads templates from a directory, keeps a set of global
//! variables (including the host application's `url_for`), and renders
//! either asynchronously, synchronously, or from a string.

pub mod config;
pub mod data;
pub mod error;
pub mod template;

pub use config::{TemplatesConfig, DEFAULT_TEMPLATES_DIR};
pub use error::TemplateError;
pub use template::{App, Context, Templates, UrlFor, UrlParams, URL_FOR};
