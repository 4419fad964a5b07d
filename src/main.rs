mod cli;

use clap::Parser;
use cli::Cli;
use render_templates::error::{self, EXIT_SUCCESS};
use render_templates::{data, Context, TemplateError, Templates, TemplatesConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Validate arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(error::EXIT_USAGE_ERROR);
    }

    match run(cli).await {
        Ok(Some(output)) => {
            println!("{}", output);
            std::process::exit(EXIT_SUCCESS);
        }
        Ok(None) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            // Print machine-readable error message to stderr
            eprintln!("{}", e.format_machine_readable());
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Log to stderr so rendered output on stdout stays clean
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Render the requested template; `None` means the output went to a file
async fn run(cli: Cli) -> Result<Option<String>, TemplateError> {
    // 1. Load configuration
    let mut config = match &cli.config {
        Some(path) => TemplatesConfig::load(path)?,
        None => TemplatesConfig::default(),
    };
    if cli.strict {
        config.strict = true;
    }

    // 2. Load and merge data files
    let vars = Context::from_json(&data::load_all(&cli.data)?)?;
    debug!(variables = vars.len(), "loaded template variables");

    // 3. Render
    let output = if let Some(path) = &cli.template {
        let template = Path::new(path);
        let configured = cli.config.as_ref().map(|_| config.directory.clone());
        config.directory = cli.template_root(template, configured.as_deref());
        let name = cli::template_name(&config.directory, template)?;

        let templates = Templates::from_config(Arc::new(()), &config);
        info!(template = %name, directory = %config.directory.display(), "rendering");
        templates.render(&name, &vars).await?
    } else if let Some(source) = &cli.string {
        if let Some(root) = &cli.root {
            config.directory = root.into();
        }
        let templates = Templates::from_config(Arc::new(()), &config);
        templates.render_string(source, &vars)?
    } else {
        return Err(TemplateError::Usage(
            "either --template or --string is required".to_string(),
        ));
    };

    // 4. Write output
    if let Some(out_path) = cli.output {
        std::fs::write(&out_path, &output)?;
        Ok(None)
    } else {
        Ok(Some(output))
    }
}
