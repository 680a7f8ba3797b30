//! Failure taxonomy for the git-notes receipt store.

use engine_error::{EngineError, ErrorCode};

/// Errors raised while reading or writing receipts.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptStoreError {
    /// `root` is not inside a git working tree; callers may retry against
    /// the sidecar-directory fallback.
    #[error("not a git repository: {0}")]
    NotAGitRepository(String),
    /// The `git` binary exited non-zero.
    #[error("git command failed: {0}")]
    GitCommandFailed(String),
    /// A filesystem operation (fallback sidecar read/write) failed.
    #[error("io error: {0}")]
    Io(String),
    /// No receipt was found for the requested commit or artifact path.
    #[error("not found: {0}")]
    NotFound(String),
    /// A stored note/sidecar body did not parse as a receipt list.
    #[error("malformed receipt store entry: {0}")]
    Malformed(String),
}

impl ReceiptStoreError {
    /// Map to the stable, cross-component [`ErrorCode`] taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotAGitRepository(_) => ErrorCode::GitUnavailable,
            Self::GitCommandFailed(_) => ErrorCode::GitUnavailable,
            Self::Io(_) => ErrorCode::IoFailed,
            Self::NotFound(_) => ErrorCode::CasMiss,
            Self::Malformed(_) => ErrorCode::MalformedAttestation,
        }
    }

    /// Convert into the shared [`EngineError`] envelope.
    pub fn into_engine_error(self) -> EngineError {
        let code = self.code();
        EngineError::new(code, self.to_string())
    }
}
