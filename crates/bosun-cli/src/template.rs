//! minijinja-backed manifest renderer

use std::path::Path;

use bosun_core::Flags;
use bosun_kube::{KubeError, ObjectKey, Renderer};
use minijinja::{Environment, Value, context};

use crate::error::{CliError, Result};

const TEMPLATE_NAME: &str = "manifest";

/// Renders one manifest template
///
/// The template sees the flags as `values` and the installation target as
/// `release.name` / `release.namespace`.
pub struct TemplateRenderer {
    env: Environment<'static>,
    release: ObjectKey,
}

impl TemplateRenderer {
    /// Compile `source`; syntax errors are reported here rather than at install time
    pub fn new(source: impl Into<String>, release: ObjectKey) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.into())
            .map_err(|e| CliError::template(e.to_string()))?;
        Ok(Self { env, release })
    }

    pub fn from_file(path: &Path, release: ObjectKey) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CliError::template(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::new(source, release)
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, flags: &Flags) -> bosun_kube::Result<String> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| KubeError::Render(e.to_string()))?;

        template
            .render(context! {
                values => Value::from_serialize(flags),
                release => context! {
                    name => self.release.name.as_str(),
                    namespace => self.release.namespace.as_str(),
                },
            })
            .map_err(|e| KubeError::Render(e.to_string()))
    }
}
