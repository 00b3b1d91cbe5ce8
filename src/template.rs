use std::sync::Arc;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;

use crate::config::ConfigError;
use crate::resources::ResourceLoader;

/// HTML templates with `${NAME}` placeholders.
///
/// Templates are loaded through the [`ResourceLoader`] on first use and kept
/// for the lifetime of the manager. Every value is HTML-escaped and inserted
/// once; a value that itself looks like `${OTHER}` comes out literally.
/// Blocks keep the usual `{% ... %}` form.
pub struct TemplateManager {
    env: Environment<'static>,
}

impl TemplateManager {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Result<Self, ConfigError> {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters("${", "}")
            .build()
            .map_err(|source| ConfigError::Template {
                name: "<syntax>".to_string(),
                source,
            })?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_loader(move |name| match loader.load_template(name) {
            Ok(source) => {
                tracing::debug!(template = name, "Template cached");
                Ok(Some(source))
            }
            Err(ConfigError::ResourceNotFound(_)) => Ok(None),
            Err(e) => Err(minijinja::Error::new(ErrorKind::InvalidOperation, "can not load template").with_source(e)),
        });

        Ok(Self { env })
    }

    /// Renders template `name` with the values of `ctx`. Placeholders
    /// without a value render as nothing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let html = templates.render("error.html", minijinja::context! {
    ///     STATUS_CODE => 404,
    ///     STATUS_MESSAGE => "Not Found",
    /// })?;
    /// ```
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, ConfigError> {
        let template_error = |source: minijinja::Error| match source.kind() {
            ErrorKind::TemplateNotFound => ConfigError::ResourceNotFound(name.to_string()),
            _ => ConfigError::Template {
                name: name.to_string(),
                source,
            },
        };

        let template = self.env.get_template(name).map_err(template_error)?;
        template.render(ctx).map_err(template_error)
    }
}

impl std::fmt::Debug for TemplateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateManager").finish_non_exhaustive()
    }
}
