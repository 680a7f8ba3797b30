//! Failure taxonomy for signing, verification, and trust-policy enforcement.

use engine_error::{EngineError, ErrorCode};

/// Errors raised by [`crate::sign`], [`crate::verify`], and
/// [`crate::trust`].
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    /// The artifact's recomputed hash does not match `provenance.artifact.hash`.
    #[error("integrity failure: {0}")]
    IntegrityFailure(String),
    /// A present signature did not verify against its claimed public key.
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),
    /// A trust policy's hard requirements were not satisfied.
    #[error("policy violation: {0}")]
    PolicyViolation(String),
    /// The signing key's fingerprint is not in the trust policy's key set.
    #[error("key untrusted: {0}")]
    KeyUntrusted(String),
    /// The signing key's validity window has elapsed.
    #[error("key expired: {0}")]
    Expired(String),
    /// The attestation document could not be parsed into a known schema.
    #[error("malformed attestation: {0}")]
    MalformedAttestation(String),
    /// No signing key material was available (not itself fatal — callers
    /// may write an unsigned attestation).
    #[error("signing key missing: {0}")]
    KeyMissing(String),
}

impl AttestError {
    /// Map to the stable, cross-component [`ErrorCode`] taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IntegrityFailure(_) => ErrorCode::IntegrityMismatch,
            Self::SignatureInvalid(_) => ErrorCode::SignatureInvalid,
            Self::PolicyViolation(_) => ErrorCode::PolicyViolation,
            Self::KeyUntrusted(_) => ErrorCode::KeyUntrusted,
            Self::Expired(_) => ErrorCode::Expired,
            Self::MalformedAttestation(_) => ErrorCode::MalformedAttestation,
            Self::KeyMissing(_) => ErrorCode::KeyMissing,
        }
    }

    /// Convert into the shared [`EngineError`] envelope.
    pub fn into_engine_error(self) -> EngineError {
        let code = self.code();
        EngineError::new(code, self.to_string())
    }
}
