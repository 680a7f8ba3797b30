use engine_error::{EngineError, ErrorCode};

/// Errors raised while ingesting RDF sources into a `Graph`.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A source failed to parse.
    #[error("parse error in source {source_index} at {position}: {message}")]
    ParseError {
        /// Index of the offending source within the input slice.
        source_index: usize,
        /// Line/column or byte position, as reported by the parser.
        position: String,
        /// Parser-provided message.
        message: String,
    },
    /// A source declared a `format` this ingestor does not support.
    #[error("unsupported source format '{format}'")]
    UnsupportedFormat {
        /// The unsupported format string.
        format: String,
    },
}

impl GraphError {
    /// Convert into the unified [`EngineError`].
    pub fn into_engine_error(self) -> EngineError {
        let code = match &self {
            Self::ParseError { .. } => ErrorCode::InputParseError,
            Self::UnsupportedFormat { .. } => ErrorCode::InputUnsupportedFormat,
        };
        let (source_index, message) = match &self {
            Self::ParseError {
                source_index,
                message,
                ..
            } => (Some(*source_index), message.clone()),
            Self::UnsupportedFormat { format } => (None, format.clone()),
        };
        let mut err = EngineError::new(code, self.to_string());
        if let Some(idx) = source_index {
            err = err.with_context("sourceIndex", idx);
        }
        let _ = message;
        err
    }
}
