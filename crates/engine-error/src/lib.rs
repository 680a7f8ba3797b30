//! Unified error taxonomy with stable error codes for the artifact engine.
//!
//! Every engine error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use the builder returned by
//! [`EngineError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed RDF, invalid arguments, unsupported formats.
    Input,
    /// Missing CAS blobs, attestations, or keys.
    NotFound,
    /// Hash or canonical-JSON mismatches.
    Integrity,
    /// Signature, trust-key, expiry, or policy failures.
    Attestation,
    /// Template renderer failures.
    Render,
    /// Transient filesystem or git errors.
    Io,
    /// Deadline exceeded or operation cancelled.
    Timeout,
    /// Operation submitted after orchestrator shutdown.
    Shutdown,
    /// Configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::NotFound => "not_found",
            Self::Integrity => "integrity",
            Self::Attestation => "attestation",
            Self::Render => "render",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::Shutdown => "shutdown",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serializes to a `SCREAMING_SNAKE_CASE` string that does not
/// change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Input --
    /// Malformed RDF or unparseable source.
    InputParseError,
    /// Source format is not supported.
    InputUnsupportedFormat,
    /// A caller-supplied value is structurally invalid (cycle, function, symbol).
    InputInvalid,

    // -- NotFound --
    /// CAS blob is absent.
    CasMiss,
    /// Attestation sidecar is absent.
    AttestationMissing,
    /// Signing or verifying key is absent.
    KeyMissing,

    // -- Integrity --
    /// Recomputed artifact hash does not match the declared hash.
    IntegrityMismatch,
    /// Attestation structure does not match any known schema.
    MalformedAttestation,

    // -- Attestation --
    /// Ed25519 signature failed to verify.
    SignatureInvalid,
    /// Signing key is not present in the trust policy.
    KeyUntrusted,
    /// Signing key or attestation has expired.
    Expired,
    /// Trust policy requirements were not met.
    PolicyViolation,

    // -- Render --
    /// The external template renderer failed.
    RenderFailed,
    /// The graph does not provide a predicate the template requires.
    ContextMissing,

    // -- Io --
    /// Transient filesystem error.
    IoFailed,
    /// The `git` subprocess failed or is unavailable.
    GitUnavailable,

    // -- Timeout --
    /// A bounded operation exceeded its deadline.
    TimedOut,
    /// The operation was cancelled via its cancellation token.
    Cancelled,

    // -- Shutdown --
    /// Operation submitted after the orchestrator entered shutdown.
    ShuttingDown,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputParseError | Self::InputUnsupportedFormat | Self::InputInvalid => {
                ErrorCategory::Input
            }
            Self::CasMiss | Self::AttestationMissing | Self::KeyMissing => {
                ErrorCategory::NotFound
            }
            Self::IntegrityMismatch | Self::MalformedAttestation => ErrorCategory::Integrity,
            Self::SignatureInvalid
            | Self::KeyUntrusted
            | Self::Expired
            | Self::PolicyViolation => ErrorCategory::Attestation,
            Self::RenderFailed | Self::ContextMissing => ErrorCategory::Render,
            Self::IoFailed | Self::GitUnavailable => ErrorCategory::Io,
            Self::TimedOut | Self::Cancelled => ErrorCategory::Timeout,
            Self::ShuttingDown => ErrorCategory::Shutdown,
            Self::ConfigInvalid => ErrorCategory::Config,
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputParseError => "INPUT_PARSE_ERROR",
            Self::InputUnsupportedFormat => "INPUT_UNSUPPORTED_FORMAT",
            Self::InputInvalid => "INPUT_INVALID",
            Self::CasMiss => "CAS_MISS",
            Self::AttestationMissing => "ATTESTATION_MISSING",
            Self::KeyMissing => "KEY_MISSING",
            Self::IntegrityMismatch => "INTEGRITY_MISMATCH",
            Self::MalformedAttestation => "MALFORMED_ATTESTATION",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::KeyUntrusted => "KEY_UNTRUSTED",
            Self::Expired => "EXPIRED",
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::RenderFailed => "RENDER_FAILED",
            Self::ContextMissing => "CONTEXT_MISSING",
            Self::IoFailed => "IO_FAILED",
            Self::GitUnavailable => "GIT_UNAVAILABLE",
            Self::TimedOut => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Unified engine error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context
/// (typically includes `operationId` so callers can cross-reference events).
///
/// # Builder usage
///
/// ```
/// use engine_error::{EngineError, ErrorCode};
///
/// let err = EngineError::new(ErrorCode::RenderFailed, "renderer raised an error")
///     .with_context("templateId", "svc-template")
///     .with_context("operationId", "op-1");
/// ```
pub struct EngineError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl EngineError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialization
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// The `operationId` context entry, if one was attached.
    pub fn operation_id(&self) -> Option<&str> {
        self.context.get("operationId").and_then(|v| v.as_str())
    }
}

impl fmt::Debug for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("EngineError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serializable snapshot of an [`EngineError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&EngineError> for EngineErrorDto {
    fn from(err: &EngineError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<EngineErrorDto> for EngineError {
    fn from(dto: EngineErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}
