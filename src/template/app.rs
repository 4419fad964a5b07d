//! The host application seen by the renderer.
//!
//! A renderer only needs one thing from its host: an optional way to build
//! URLs, which templates call as `url_for("route", param=value)`.

use minijinja::value::Kwargs;
use minijinja::{Error, ErrorKind, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Keyword parameters passed to `url_for`, stringified
pub type UrlParams = BTreeMap<String, String>;

/// A URL-generation function: `(route name, params) -> url`
pub type UrlFor = Arc<dyn Fn(&str, &UrlParams) -> anyhow::Result<String> + Send + Sync>;

/// A host application that templates are rendered for.
///
/// Applications without routing can rely on the default, which exposes no
/// URL builder.
pub trait App: Send + Sync {
    fn url_for(&self) -> Option<UrlFor> {
        None
    }
}

/// A host without URL generation
impl App for () {}

/// Wrap a URL builder as a template function.
///
/// The returned URL is marked safe so auto-escaping leaves the slashes alone.
pub(crate) fn url_for_function(url_for: UrlFor) -> Value {
    Value::from_function(move |name: String, kwargs: Kwargs| -> Result<Value, Error> {
        let mut params = UrlParams::new();
        for key in kwargs.args() {
            let value: Value = kwargs.get(key)?;
            params.insert(key.to_string(), value.to_string());
        }
        kwargs.assert_all_used()?;

        let url = url_for(&name, &params).map_err(|err| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("url_for('{}') failed: {:#}", name, err),
            )
        })?;
        Ok(Value::from_safe_string(url))
    })
}
