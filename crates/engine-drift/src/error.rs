//! Drift-detector error taxonomy.

use engine_error::{EngineError, ErrorCode};

/// Errors raised while fingerprinting or comparing inputs.
#[derive(Debug, thiserror::Error)]
pub enum DriftError {
    /// An input claimed a content type it does not parse as (e.g. invalid
    /// UTF-8 for a text-like type).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DriftError {
    /// Convert into the shared [`EngineError`] envelope.
    pub fn into_engine_error(self) -> EngineError {
        EngineError::new(ErrorCode::InputInvalid, self.to_string())
    }
}
