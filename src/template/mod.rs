pub mod app;
pub mod context;
pub mod renderer;

pub use app::{App, UrlFor, UrlParams};
pub use context::Context;
pub use renderer::{Templates, URL_FOR};
