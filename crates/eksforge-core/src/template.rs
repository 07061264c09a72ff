//! Template expansion
//!
//! Stack files are expanded with Tera before parsing, so values can come
//! from the environment (`region "{{ EKSFORGE_REGION }}"`). The same
//! processor renders the Windows node bootstrap script.

use crate::error::{ConfigError, Result};
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, info};

/// Environment variable prefixes exposed to stack templates
const ALLOWED_PREFIXES: &[&str] = &["EKSFORGE_", "CI_"];

/// Template processor
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// Add a variable
    pub fn add_variable(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.insert(key.into(), &value);
    }

    /// Add environment variables carrying one of the allowed prefixes
    ///
    /// Only `EKSFORGE_*` and `CI_*` variables are exposed; everything else in
    /// the environment stays out of the template context.
    #[tracing::instrument(skip(self))]
    pub fn add_env_variables(&mut self) {
        let mut count = 0;

        for (key, value) in std::env::vars() {
            if ALLOWED_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
            {
                debug!(key = %key, "Adding environment variable");
                self.context.insert(key, &serde_json::Value::String(value));
                count += 1;
            }
        }

        info!(
            env_var_count = count,
            "Added filtered environment variables"
        );
    }

    /// Render a string as a template
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| ConfigError::TemplateRenderError(extract_tera_error_detail(&e)))
    }

    /// Read a file and render it
    pub fn render_file(&mut self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.render_str(&content).map_err(|e| match e {
            ConfigError::TemplateRenderError(message) => ConfigError::TemplateError {
                file: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the error chain of a Tera error into one message
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!(
            "undefined variable: `{var_name}`\nhint: export it as an EKSFORGE_* environment variable"
        );
    }

    full_error
}
