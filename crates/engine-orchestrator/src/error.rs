//! Orchestrator error taxonomy: wraps every downstream crate's error and
//! adds the orchestrator-specific shutdown/cancellation/timeout kinds.

use engine_error::{EngineError, ErrorCode};

/// Errors surfaced by orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A caller attempted to start an operation while `state != ready`.
    #[error("operation rejected: orchestrator is not ready")]
    ShuttingDown,

    /// The operation's cancellation token fired before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation exceeded its configured timeout.
    #[error("operation timed out: {0}")]
    TimedOut(String),

    /// An invalid state transition was attempted.
    #[error("invalid orchestrator state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the orchestrator was in.
        from: crate::state::OrchestratorState,
        /// State the caller tried to move it to.
        to: crate::state::OrchestratorState,
    },

    /// Graph ingestion failed.
    #[error(transparent)]
    Graph(#[from] engine_graph::GraphError),

    /// Template rendering failed.
    #[error(transparent)]
    Render(#[from] engine_render::RenderError),

    /// A CAS read or write failed.
    #[error(transparent)]
    Cas(#[from] engine_cas::CasError),

    /// Attestation build, signing, or verification failed.
    #[error(transparent)]
    Attest(#[from] engine_attest::AttestError),

    /// Receipt storage failed.
    #[error(transparent)]
    ReceiptStore(#[from] engine_receipt_store::ReceiptStoreError),

    /// An artifact model failed to build.
    #[error(transparent)]
    Build(#[from] engine_core::BuildError),
}

impl OrchestratorError {
    /// The stable [`ErrorCode`] this error maps to, without consuming it —
    /// used to label [`crate::event::Event::Error`] as the error propagates.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ShuttingDown => ErrorCode::ShuttingDown,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::TimedOut(_) => ErrorCode::TimedOut,
            Self::InvalidTransition { .. } => ErrorCode::Internal,
            Self::Graph(e) => match e {
                engine_graph::GraphError::ParseError { .. } => ErrorCode::InputParseError,
                engine_graph::GraphError::UnsupportedFormat { .. } => ErrorCode::InputUnsupportedFormat,
            },
            Self::Render(e) => match e {
                engine_render::RenderError::TemplateError { .. } => ErrorCode::RenderFailed,
                engine_render::RenderError::ContextError { .. } => ErrorCode::ContextMissing,
            },
            Self::Cas(e) => e.error_code(),
            Self::Attest(e) => e.code(),
            Self::ReceiptStore(e) => e.code(),
            Self::Build(_) => ErrorCode::InputInvalid,
        }
    }

    /// Convert into the shared [`EngineError`] envelope, tagging the
    /// originating `operationId` for cross-referencing with events.
    pub fn into_engine_error(self, operation_id: Option<&str>) -> EngineError {
        let mut error = match self {
            Self::ShuttingDown => EngineError::new(ErrorCode::ShuttingDown, "operation rejected: orchestrator is not ready"),
            Self::Cancelled => EngineError::new(ErrorCode::Cancelled, "operation cancelled"),
            Self::TimedOut(detail) => EngineError::new(ErrorCode::TimedOut, detail),
            Self::InvalidTransition { from, to } => EngineError::new(
                ErrorCode::Internal,
                format!("invalid orchestrator state transition: {from:?} -> {to:?}"),
            ),
            Self::Graph(e) => e.into_engine_error(),
            Self::Render(e) => e.into_engine_error(),
            Self::Cas(e) => e.into_engine_error(),
            Self::Attest(e) => e.into_engine_error(),
            Self::ReceiptStore(e) => e.into_engine_error(),
            Self::Build(e) => EngineError::new(ErrorCode::InputInvalid, e.to_string()),
        };
        if let Some(id) = operation_id {
            error = error.with_context("operationId", id);
        }
        error
    }
}
