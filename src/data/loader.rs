use crate::error::TemplateError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::merger::deep_merge;

/// Supported data file formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension().and_then(|e| e.to_str())?;
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> anyhow::Result<Value> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        })
    }
}

/// Load a single YAML or JSON file into a JSON value
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Value, TemplateError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let format = Format::from_path(path).ok_or_else(|| TemplateError::DataFileParse {
        path: path_str.clone(),
        source: anyhow::anyhow!(
            "Unsupported file extension: '{}'. Expected .yaml, .yml, or .json",
            path.extension().and_then(|e| e.to_str()).unwrap_or("")
        ),
    })?;

    let content = fs::read_to_string(path).map_err(|e| TemplateError::DataFileRead {
        path: path_str.clone(),
        source: e,
    })?;

    let value = format
        .parse(&content)
        .map_err(|e| TemplateError::DataFileParse {
            path: path_str.clone(),
            source: e,
        })?;

    debug!(path = %path_str, ?format, "loaded data file");
    Ok(value)
}

/// Load several files and deep-merge them, later files taking precedence
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Value, TemplateError> {
    let mut merged = Value::Object(serde_json::Map::new());
    for path in paths {
        let value = load_file(path)?;
        deep_merge(&mut merged, value);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"title": "Home", "count": 3}}"#).unwrap();

        let value = load_file(file.path()).unwrap();
        assert_eq!(value, json!({"title": "Home", "count": 3}));
    }

    #[test]
    fn test_load_yaml_both_extensions() {
        for suffix in [".yaml", ".yml"] {
            let mut file = NamedTempFile::with_suffix(suffix).unwrap();
            writeln!(file, "site: Example").unwrap();

            let value = load_file(file.path()).unwrap();
            assert_eq!(value, json!({"site": "Example"}));
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "site = 'Example'").unwrap();

        match load_file(file.path()) {
            Err(TemplateError::DataFileParse { source, .. }) => {
                assert!(source.to_string().contains("Unsupported file extension"));
            }
            other => panic!("Expected DataFileParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "{{not json").unwrap();

        assert!(matches!(
            load_file(file.path()),
            Err(TemplateError::DataFileParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_file("/nonexistent/context.yaml"),
            Err(TemplateError::DataFileRead { .. })
        ));
    }

    #[test]
    fn test_load_all_empty_is_empty_object() {
        let paths: Vec<&Path> = vec![];
        assert_eq!(load_all(&paths).unwrap(), json!({}));
    }

    #[test]
    fn test_load_all_later_wins() {
        let mut first = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(first, "title: Draft\nauthor: Ana").unwrap();

        let mut second = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(second, r#"{{"title": "Final"}}"#).unwrap();

        let value = load_all(&[first.path(), second.path()]).unwrap();
        assert_eq!(value, json!({"title": "Final", "author": "Ana"}));
    }
}
