//! Configuration loading, env overrides, and validation for the artifact
//! engine.
//!
//! [`EngineConfig`] is the top-level settings object, assembled from the
//! closed per-component structs [`CasConfig`], [`RenderConfig`],
//! [`AttestationConfig`], [`DriftConfig`]. Loading parses TOML (or falls
//! back to defaults), then applies environment overrides, then validates
//! into advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::path::Path;

use engine_core::model::AttestationFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more hard errors).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level configuration issues that do not prevent operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A drift tolerance is unusually permissive.
    LooseTolerance {
        /// The configured tolerance.
        tolerance: f64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            Self::LooseTolerance { tolerance } => {
                write!(f, "drift tolerance {tolerance} is unusually permissive")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CasConfig
// ---------------------------------------------------------------------------

/// Which [`engine_cas::CasBackend`] to construct, and with what bound.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CasBackendKind {
    /// In-memory store; contents do not survive the process.
    Memory,
    /// Filesystem store rooted at `base_path`, laid out `{base}/{hh}/{rest}`.
    File {
        /// Root directory for the content-addressed layout.
        base_path: String,
    },
}

/// Content-addressed storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct CasConfig {
    /// Backend selection.
    pub backend: CasBackendKind,
    /// Optional cap on the number of distinct blobs retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    /// Optional cap on total stored bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

impl Default for CasConfig {
    fn default() -> Self {
        Self { backend: CasBackendKind::Memory, max_entries: None, max_bytes: None }
    }
}

// ---------------------------------------------------------------------------
// RenderConfig
// ---------------------------------------------------------------------------

/// Template renderer settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Strip the first newline after a block tag.
    pub trim_blocks: bool,
    /// Strip leading whitespace before a block tag.
    pub lstrip_blocks: bool,
    /// HTML-escape rendered output.
    pub autoescape: bool,
    /// Error (rather than render empty) on an undefined variable.
    pub strict_undefined: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { trim_blocks: true, lstrip_blocks: true, autoescape: false, strict_undefined: false }
    }
}

// ---------------------------------------------------------------------------
// AttestationConfig
// ---------------------------------------------------------------------------

/// Attestation signing and storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AttestationConfig {
    /// Whether attestation is performed at all (`TOOL_ENABLE_ATTESTATION`).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimal or Full provenance detail (reuses the wire-level
    /// [`AttestationFormat`] rather than a parallel enum).
    pub mode: AttestationFormat,
    /// Path to the Ed25519 signing key, if signing is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_path: Option<String>,
    /// Path to the Ed25519 verifying key, if verification is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_key_path: Option<String>,
    /// Write receipts to `refs/notes/attestations` in addition to the
    /// sidecar file.
    pub enable_git_notes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AttestationFormat::Full,
            signing_key_path: None,
            verifying_key_path: None,
            enable_git_notes: false,
        }
    }
}

// ---------------------------------------------------------------------------
// DriftConfig
// ---------------------------------------------------------------------------

/// Which hash the drift detector uses for similarity scoring.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DriftAlgorithm {
    /// Ignore formatting/ordering differences, compare semantic content.
    SemanticHash,
    /// Byte-exact comparison.
    ContentHash,
}

/// Per-severity weights used when averaging a drift score. Mirrors the
/// fixed weights `engine-drift` applies internally; overriding these here
/// does not change `engine-drift`'s compiled-in defaults, but is surfaced
/// for validation and for future wiring.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DriftWeights {
    /// Weight for a `critical` difference.
    pub critical: f64,
    /// Weight for a `major` difference.
    pub major: f64,
    /// Weight for a `minor` difference.
    pub minor: f64,
    /// Weight for an `info` difference.
    pub info: f64,
}

impl Default for DriftWeights {
    fn default() -> Self {
        Self { critical: 1.0, major: 0.5, minor: 0.2, info: 0.05 }
    }
}

/// Drift detection settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct DriftConfig {
    /// Similarity threshold below which `hasDrift` is reported.
    pub tolerance: f64,
    /// Which hash drives the comparison.
    pub algorithm: DriftAlgorithm,
    /// Severity weighting used in the drift score average.
    #[serde(default)]
    pub weights: DriftWeights,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self { tolerance: 1.0, algorithm: DriftAlgorithm::SemanticHash, weights: DriftWeights::default() }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level runtime configuration for the artifact engine.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Content-addressed storage settings.
    pub cas: CasConfig,
    /// Template renderer settings.
    pub render: RenderConfig,
    /// Attestation settings.
    pub attestation: AttestationConfig,
    /// Drift detection settings.
    pub drift: DriftConfig,
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`), consumed by
    /// the embedding binary when installing its `tracing` subscriber.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cas: CasConfig::default(),
            render: RenderConfig::default(),
            attestation: AttestationConfig::default(),
            drift: DriftConfig::default(),
            log_level: Some("info".into()),
        }
    }
}

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`EngineConfig`] from an optional TOML file path, then apply
/// environment overrides.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, starts from [`EngineConfig::default()`].
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .map_err(|_| ConfigError::FileNotFound { path: p.display().to_string() })?;
            parse_toml(&content)?
        }
        None => EngineConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`EngineConfig`].
pub fn parse_toml(content: &str) -> Result<EngineConfig, ConfigError> {
    toml::from_str::<EngineConfig>(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply the three supported environment variable overrides:
/// - `TOOL_CAS_BASE` forces the CAS backend to `File` at the given path.
/// - `TOOL_SIGNING_KEY` / `TOOL_VERIFYING_KEY` override key paths.
/// - `TOOL_ENABLE_ATTESTATION` toggles `attestation.enabled`.
pub fn apply_env_overrides(config: &mut EngineConfig) {
    if let Ok(base) = std::env::var("TOOL_CAS_BASE") {
        config.cas.backend = CasBackendKind::File { base_path: base };
    }
    if let Ok(key) = std::env::var("TOOL_SIGNING_KEY") {
        config.attestation.signing_key_path = Some(key);
    }
    if let Ok(key) = std::env::var("TOOL_VERIFYING_KEY") {
        config.attestation.verifying_key_path = Some(key);
    }
    if let Ok(val) = std::env::var("TOOL_ENABLE_ATTESTATION") {
        if let Ok(enabled) = val.parse::<bool>() {
            config.attestation.enabled = enabled;
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed [`EngineConfig`], returning advisory warnings.
///
/// Hard errors (empty CAS base path, out-of-range tolerance, invalid log
/// level) come back as [`ConfigError::ValidationError`]; soft issues are
/// [`ConfigWarning`]s.
pub fn validate_config(config: &EngineConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let CasBackendKind::File { base_path } = &config.cas.backend {
        if base_path.trim().is_empty() {
            errors.push("cas.backend.basePath must not be empty".to_string());
        }
    }

    if !(0.0..=1.0).contains(&config.drift.tolerance) {
        errors.push(format!("drift.tolerance {} out of range [0.0, 1.0]", config.drift.tolerance));
    } else if config.drift.tolerance > 0.5 {
        warnings.push(ConfigWarning::LooseTolerance { tolerance: config.drift.tolerance });
    }

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    if config.attestation.enabled && config.attestation.signing_key_path.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "attestation.signingKeyPath".to_string(),
            hint: "attestations will be built but not signed".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}
