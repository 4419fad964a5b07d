use crate::config::{TemplatesConfig, DEFAULT_TEMPLATES_DIR};
use crate::error::TemplateError;
use minijinja::{path_loader, AutoEscape, Environment, UndefinedBehavior, Value};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::app::{url_for_function, App};
use super::context::Context;

/// Name reported for templates rendered from a string
const STRING_TEMPLATE_NAME: &str = "<string>";

/// Global variable the host's URL builder is bound to
pub const URL_FOR: &str = "url_for";

/// Template rendering for a host application.
///
/// Templates are loaded by name from a single directory. Every render sees
/// the global [`Context`] with the per-call variables layered on top; the
/// globals themselves are never modified by a render.
///
/// The engine is shared copy-on-write: reconfiguring the renderer never
/// disturbs a [`render`](Self::render) that is already in flight, and the
/// sync and async entry points can be used concurrently.
///
/// # Example
///
/// ```no_run
/// use minijinja::context;
/// use render_templates::Templates;
/// use std::sync::Arc;
///
/// let templates = Templates::for_app(Arc::new(()));
/// let _page = templates.render_sync("index.html", context! { title => "Home" })?;
/// let sum = templates.render_string("{{ 1 + 2 }}", ())?;
/// assert_eq!(sum, "3");
/// # Ok::<(), render_templates::TemplateError>(())
/// ```
#[derive(Clone)]
pub struct Templates {
    app: Arc<dyn App>,
    directory: PathBuf,
    context: Context,
    env: Arc<Environment<'static>>,
    /// The `url_for` value this renderer inserted, if any
    url_for_binding: Option<Value>,
}

impl Templates {
    /// Create a renderer loading templates from `directory` with the given
    /// global variables.
    pub fn new(app: Arc<dyn App>, directory: impl Into<PathBuf>, context: Context) -> Self {
        let config = TemplatesConfig {
            directory: directory.into(),
            ..TemplatesConfig::default()
        };
        Self::build(app, &config, context)
    }

    /// Create a renderer with the default `templates` directory and no globals
    pub fn for_app(app: Arc<dyn App>) -> Self {
        Self::new(app, DEFAULT_TEMPLATES_DIR, Context::new())
    }

    pub fn from_config(app: Arc<dyn App>, config: &TemplatesConfig) -> Self {
        let context = config
            .context
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();
        Self::build(app, config, context)
    }

    fn build(app: Arc<dyn App>, config: &TemplatesConfig, context: Context) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(&config.directory));
        if config.autoescape {
            env.set_auto_escape_callback(|_| AutoEscape::Html);
        } else {
            env.set_auto_escape_callback(|_| AutoEscape::None);
        }
        env.set_undefined_behavior(if config.strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        env.set_keep_trailing_newline(config.keep_trailing_newline);

        debug!(
            directory = %config.directory.display(),
            autoescape = config.autoescape,
            strict = config.strict,
            globals = context.len(),
            "template engine configured"
        );

        let mut templates = Self {
            app,
            directory: config.directory.clone(),
            context,
            env: Arc::new(env),
            url_for_binding: None,
        };
        templates.bind_url_for();
        templates
    }

    pub fn app(&self) -> &Arc<dyn App> {
        &self.app
    }

    /// Replace the host application and re-derive the `url_for` binding
    pub fn set_app(&mut self, app: Arc<dyn App>) {
        self.app = app;
        self.bind_url_for();
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Point template lookups at `directory`.
    ///
    /// Templates the engine has already compiled stay cached.
    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
        let loader = path_loader(&self.directory);
        Arc::make_mut(&mut self.env).set_loader(loader);
        debug!(directory = %self.directory.display(), "template directory changed");
    }

    /// The global variables visible to every render
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Replace the global variables wholesale.
    ///
    /// `url_for` is bound again from the current host afterwards.
    pub fn set_context(&mut self, context: Context) {
        self.context = context;
        self.url_for_binding = None;
        self.bind_url_for();
    }

    /// The underlying engine
    pub fn engine(&self) -> &Environment<'static> {
        &self.env
    }

    /// Mutable access to the engine, e.g. to register filters or functions
    pub fn engine_mut(&mut self) -> &mut Environment<'static> {
        Arc::make_mut(&mut self.env)
    }

    fn bind_url_for(&mut self) {
        match self.app.url_for() {
            Some(url_for) => {
                let function = url_for_function(url_for);
                self.context.insert(URL_FOR, function.clone());
                self.url_for_binding = Some(function);
                debug!("bound url_for from host application");
            }
            None => {
                // Only drop the entry if it is still the one bound here
                if let Some(bound) = self.url_for_binding.take() {
                    if self.context.get(URL_FOR) == Some(&bound) {
                        self.context.remove(URL_FOR);
                        warn!("host application has no url_for, removed previous binding");
                    }
                }
            }
        }
    }

    /// Render the template `name` without blocking the calling task.
    ///
    /// Loading, compiling and evaluating happen on the blocking thread pool
    /// against a snapshot of the engine.
    pub async fn render<S: Serialize>(&self, name: &str, vars: S) -> Result<String, TemplateError> {
        debug!(template = name, mode = "async", "rendering template");
        let ctx = self.context.overlay(&vars)?;
        drop(vars);
        let env = Arc::clone(&self.env);
        let name = name.to_string();

        tokio::task::spawn_blocking(move || render_named(&env, &name, ctx)).await?
    }

    /// Render the template `name` on the current thread
    pub fn render_sync<S: Serialize>(&self, name: &str, vars: S) -> Result<String, TemplateError> {
        debug!(template = name, mode = "sync", "rendering template");
        let ctx = self.context.overlay(&vars)?;
        render_named(&self.env, name, ctx)
    }

    /// Compile `source` and render it on the current thread
    pub fn render_string<S: Serialize>(&self, source: &str, vars: S) -> Result<String, TemplateError> {
        debug!(bytes = source.len(), mode = "string", "rendering template");
        let ctx = self.context.overlay(&vars)?;
        self.env
            .render_str(source, ctx)
            .map_err(|e| TemplateError::from_engine(STRING_TEMPLATE_NAME, e))
    }
}

fn render_named(env: &Environment<'static>, name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = env
        .get_template(name)
        .map_err(|e| TemplateError::from_engine(name, e))?;
    template
        .render(ctx)
        .map_err(|e| TemplateError::from_engine(name, e))
}

impl fmt::Debug for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templates")
            .field("directory", &self.directory)
            .field("globals", &self.context.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("url_for_bound", &self.url_for_binding.is_some())
            .finish()
    }
}
