use engine_error::{EngineError, ErrorCode};

/// Errors raised by the render engine.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The external template renderer raised an error.
    #[error("template '{template_id}' failed to render: {message}")]
    TemplateError {
        /// Id of the offending template.
        template_id: String,
        /// Renderer-provided message.
        message: String,
    },
    /// The graph did not provide a predicate the template requires.
    #[error("context is missing required value at '{path}'")]
    ContextError {
        /// Dotted path that was missing.
        path: String,
    },
}

impl RenderError {
    /// Convert into the unified [`EngineError`].
    pub fn into_engine_error(self) -> EngineError {
        match self {
            Self::TemplateError { template_id, message } => {
                EngineError::new(ErrorCode::RenderFailed, message).with_context("templateId", template_id)
            }
            Self::ContextError { path } => {
                EngineError::new(ErrorCode::ContextMissing, format!("missing '{path}'"))
            }
        }
    }
}
