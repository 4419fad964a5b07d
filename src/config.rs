use crate::data;
use crate::error::TemplateError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default template directory, relative to the working directory
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Renderer configuration, loadable from a YAML or JSON file.
///
/// Every field is optional in the file:
///
/// ```yaml
/// directory: site/templates
/// strict: true
/// context:
///   site_name: Example
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory templates are loaded from
    pub directory: PathBuf,
    /// HTML-escape interpolated values
    pub autoescape: bool,
    /// Treat any use of an undefined variable as a render error
    pub strict: bool,
    /// Keep the final newline of a template in the output
    pub keep_trailing_newline: bool,
    /// Initial global variables
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            autoescape: true,
            strict: false,
            keep_trailing_newline: false,
            context: serde_json::Map::new(),
        }
    }
}

impl TemplatesConfig {
    /// Load a configuration file (format chosen by extension)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let value = data::load_file(path)?;

        // An empty YAML document parses to null
        if value.is_null() {
            return Ok(Self::default());
        }

        serde_json::from_value(value).map_err(|e| TemplateError::InvalidConfig {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = TemplatesConfig::default();
        assert_eq!(config.directory, PathBuf::from("templates"));
        assert!(config.autoescape);
        assert!(!config.strict);
        assert!(!config.keep_trailing_newline);
        assert!(config.context.is_empty());
    }

    #[test]
    fn test_load_yaml_partial() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "directory: site/templates").unwrap();
        writeln!(file, "strict: true").unwrap();
        writeln!(file, "context:").unwrap();
        writeln!(file, "  site_name: Example").unwrap();

        let config = TemplatesConfig::load(file.path()).unwrap();
        assert_eq!(config.directory, PathBuf::from("site/templates"));
        assert!(config.strict);
        assert!(config.autoescape);
        assert_eq!(config.context.get("site_name"), Some(&json!("Example")));
    }

    #[test]
    fn test_load_empty_yaml() {
        let file = NamedTempFile::with_suffix(".yml").unwrap();
        assert_eq!(
            TemplatesConfig::load(file.path()).unwrap(),
            TemplatesConfig::default()
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"dir": "templates"}}"#).unwrap();

        assert!(matches!(
            TemplatesConfig::load(file.path()),
            Err(TemplateError::InvalidConfig { .. })
        ));
    }
}
