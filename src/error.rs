use minijinja::ErrorKind;
use std::fmt;

/// Process exit codes used by the `render-templates` binary
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_USAGE_ERROR: i32 = 2;
pub const EXIT_TEMPLATE_NOT_FOUND: i32 = 3;
pub const EXIT_DATA_ERROR: i32 = 4;
pub const EXIT_IO_ERROR: i32 = 5;
pub const EXIT_RENDER_ERROR: i32 = 6;

/// Where in a template an engine error was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub template: String,
    pub line: usize,
}

impl Location {
    /// Extract the location recorded by the engine, falling back to `fallback_name`
    pub fn from_engine(err: &minijinja::Error, fallback_name: &str) -> Self {
        Location {
            template: err.name().unwrap_or(fallback_name).to_string(),
            line: err.line().unwrap_or(0),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.template)
        } else {
            write!(f, "{}:{}", self.template, self.line)
        }
    }
}

/// Main error type for render-templates
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    // Lookup errors
    #[error("Template not found: '{name}'")]
    NotFound {
        name: String,
        source: minijinja::Error,
    },

    // Syntax and evaluation errors
    #[error("Failed to render template '{name}': {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },

    #[error("Template variables must be a map, got {kind}")]
    InvalidContext { kind: String },

    // Data loading errors
    #[error("Failed to read data file '{path}': {source}")]
    DataFileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse data file '{path}': {source}")]
    DataFileParse {
        path: String,
        source: anyhow::Error,
    },

    #[error("Invalid configuration in '{path}': {source}")]
    InvalidConfig {
        path: String,
        source: serde_json::Error,
    },

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Usage error: {0}")]
    Usage(String),
}

impl TemplateError {
    /// Classify an engine error raised while looking up or rendering `name`
    pub fn from_engine(name: &str, source: minijinja::Error) -> Self {
        match source.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound {
                name: name.to_string(),
                source,
            },
            _ => TemplateError::Render {
                name: name.to_string(),
                source,
            },
        }
    }

    /// True for the "template not found" lookup condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound { .. })
    }

    /// The underlying engine error, if this error came from the engine
    pub fn engine_error(&self) -> Option<&minijinja::Error> {
        match self {
            TemplateError::NotFound { source, .. } | TemplateError::Render { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TemplateError::Usage(_) => EXIT_USAGE_ERROR,
            TemplateError::NotFound { .. } => EXIT_TEMPLATE_NOT_FOUND,
            TemplateError::DataFileRead { .. }
            | TemplateError::DataFileParse { .. }
            | TemplateError::InvalidConfig { .. }
            | TemplateError::InvalidContext { .. } => EXIT_DATA_ERROR,
            TemplateError::Io(_) => EXIT_IO_ERROR,
            TemplateError::Render { .. } | TemplateError::Task(_) => EXIT_RENDER_ERROR,
        }
    }

    /// Format error for machine-readable output
    pub fn format_machine_readable(&self) -> String {
        match self {
            TemplateError::NotFound { name, .. } => {
                format!("ERROR code=TEMPLATE_NOT_FOUND name=\"{}\"", name)
            }
            TemplateError::Render { name, source } => {
                let location = Location::from_engine(source, name);
                format!(
                    "ERROR code=RENDER_ERROR template=\"{}\" line={} kind={:?}",
                    location.template,
                    location.line,
                    source.kind()
                )
            }
            TemplateError::DataFileRead { path, .. } | TemplateError::DataFileParse { path, .. } => {
                format!("ERROR code=DATA_ERROR file=\"{}\"", path)
            }
            TemplateError::InvalidConfig { path, .. } => {
                format!("ERROR code=CONFIG_ERROR file=\"{}\"", path)
            }
            _ => format!("ERROR: {}", self),
        }
    }
}
