use engine_error::{EngineError, ErrorCode};

/// Errors raised by a [`crate::CasBackend`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// No blob exists for the requested hash.
    #[error("blob not found for hash '{hash}'")]
    NotFound {
        /// The hash that was requested.
        hash: String,
    },
    /// `clear(force=false)` was called on a non-empty disk backend.
    #[error("store is not empty; pass force=true to clear anyway")]
    NotEmpty,
    /// Underlying filesystem I/O failed.
    #[error("cas io error: {0}")]
    Io(String),
}

impl CasError {
    /// Stable error code for this failure.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::CasMiss,
            Self::NotEmpty => ErrorCode::InputInvalid,
            Self::Io(_) => ErrorCode::IoFailed,
        }
    }

    /// Convert into the unified [`EngineError`].
    pub fn into_engine_error(self) -> EngineError {
        let code = self.error_code();
        EngineError::new(code, self.to_string())
    }
}

impl From<std::io::Error> for CasError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
