use clap::Parser;
use path_clean::PathClean;
use render_templates::TemplateError;
use std::path::{Component, Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "render-templates",
    version,
    about = "Render templates from a directory with YAML/JSON variables",
    long_about = "Renders a template file (or a template given as a string) with HTML auto-escaping. \
                  Variables come from YAML/JSON data files, deep-merged in order, layered over the \
                  global context of an optional configuration file."
)]
pub struct Cli {
    /// Template file path
    #[arg(
        short = 't',
        long = "template",
        value_name = "PATH",
        required_unless_present = "string",
        conflicts_with = "string"
    )]
    pub template: Option<String>,

    /// Render this template source instead of a file
    #[arg(short = 's', long = "string", value_name = "SOURCE")]
    pub string: Option<String>,

    /// Data files (YAML/JSON). Can be specified multiple times.
    /// Multiple files will be deep-merged with later files taking precedence.
    #[arg(short = 'd', long = "data", value_name = "PATH")]
    pub data: Vec<String>,

    /// Output file path. If not specified, output goes to stdout.
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    pub output: Option<String>,

    /// Template directory.
    /// If not specified, uses the configured directory, or else the template file's directory.
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    pub root: Option<String>,

    /// Renderer configuration file (YAML/JSON)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<String>,

    /// Strict mode: treat undefined variables as errors
    #[arg(long = "strict")]
    pub strict: bool,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(template) = &self.template {
            if template.trim().is_empty() {
                return Err("template path must not be empty".to_string());
            }
        }

        if let Some(root) = &self.root {
            if !Path::new(root).is_dir() {
                return Err(format!("root '{}' is not a directory", root));
            }
        }

        Ok(())
    }

    /// Directory to load `template` from: `--root`, then the configured
    /// directory, then the template's own directory
    pub fn template_root(&self, template: &Path, configured: Option<&Path>) -> PathBuf {
        if let Some(root) = &self.root {
            return PathBuf::from(root);
        }
        if let Some(dir) = configured {
            return dir.to_path_buf();
        }
        match template.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// The engine name of `template` relative to `root`, with `/` separators
pub fn template_name(root: &Path, template: &Path) -> Result<String, TemplateError> {
    let cwd = std::env::current_dir()?;
    let root = cwd.join(root).clean();
    let template = cwd.join(template).clean();

    let relative = template.strip_prefix(&root).map_err(|_| {
        TemplateError::Usage(format!(
            "template '{}' is outside the template directory '{}'",
            template.display(),
            root.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(TemplateError::Usage(format!(
            "'{}' is a directory, not a template",
            template.display()
        )));
    }
    Ok(parts.join("/"))
}
