//! The external renderer interface and its `minijinja` implementation.

use crate::error::RenderError;
use serde_json::Value;

/// Narrow interface to the (externally-owned) template language. The
/// engine never depends on the template grammar directly — only on this
/// trait — so swapping renderers never touches the rest of the workspace.
pub trait TemplateRenderer: Send + Sync {
    /// Render `body` against `context`, returning the output string.
    fn render(&self, template_id: &str, body: &str, context: &Value) -> Result<String, RenderError>;
}

/// `minijinja`-backed renderer, configured for determinism: autoescape
/// off, non-strict undefined, and trim/lstrip blocks so whitespace is
/// byte-stable.
pub struct MinijinjaRenderer;

impl MinijinjaRenderer {
    /// Construct the renderer. Stateless: a fresh `minijinja::Environment`
    /// is built per render call so templates never leak state between
    /// invocations — required for S1's "byte-identical across runs" claim.
    pub fn new() -> Self {
        Self
    }

    fn environment(&self) -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        env.set_auto_escape_callback(|_name| minijinja::AutoEscape::None);
        env
    }
}

impl Default for MinijinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MinijinjaRenderer {
    fn render(&self, template_id: &str, body: &str, context: &Value) -> Result<String, RenderError> {
        let mut env = self.environment();
        env.add_template(template_id, body)
            .map_err(|e| RenderError::TemplateError {
                template_id: template_id.to_string(),
                message: e.to_string(),
            })?;
        let tmpl = env
            .get_template(template_id)
            .map_err(|e| RenderError::TemplateError {
                template_id: template_id.to_string(),
                message: e.to_string(),
            })?;
        tmpl.render(context).map_err(|e| RenderError::TemplateError {
            template_id: template_id.to_string(),
            message: e.to_string(),
        })
    }
}
