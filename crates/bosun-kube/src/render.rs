//! Chart rendering seam
//!
//! Install only needs the rendered manifest text for a set of flags. The
//! template engine behind it is the caller's choice.

use bosun_core::Flags;

use crate::error::Result;

/// Produces a multi-document manifest from chart flags
pub trait Renderer: Send + Sync {
    /// Render the manifest; failures should be reported as [`KubeError::Render`](crate::KubeError::Render)
    fn render(&self, flags: &Flags) -> Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&Flags) -> Result<String> + Send + Sync,
{
    fn render(&self, flags: &Flags) -> Result<String> {
        self(flags)
    }
}

/// Renderer for an already rendered manifest; flags are ignored
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    manifest: String,
}

impl StaticRenderer {
    pub fn new(manifest: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
        }
    }
}

impl Renderer for StaticRenderer {
    fn render(&self, _flags: &Flags) -> Result<String> {
        Ok(self.manifest.clone())
    }
}
