//! Fluent, consuming builders for the shared data model, mirroring the
//! `WorkOrderBuilder` / `ReceiptBuilder` idiom used throughout the ambient
//! stack this workspace descends from.

use crate::canon;
use crate::model::{
    Artifact, ArtifactRef, Attestation, AttestationFormat, GraphRef, Integrity, Provenance,
    TemplateRef, TrustPolicy, TrustRequirements, TrustedKey,
};
use std::collections::{BTreeMap, BTreeSet};

/// Errors raised when a builder's required fields are missing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    /// A required field was never set.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

/// Fluent builder for [`Artifact`].
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct ArtifactBuilder {
    template_id: Option<String>,
    artifact_type: Option<String>,
    language: Option<String>,
    content: Option<String>,
    output_path: Option<String>,
    dependencies: BTreeSet<String>,
}

impl ArtifactBuilder {
    /// Start a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the producing template's id.
    pub fn template_id(mut self, id: impl Into<String>) -> Self {
        self.template_id = Some(id.into());
        self
    }

    /// Set the artifact type (copied from the template).
    pub fn artifact_type(mut self, t: impl Into<String>) -> Self {
        self.artifact_type = Some(t.into());
        self
    }

    /// Set the artifact language (copied from the template).
    pub fn language(mut self, l: impl Into<String>) -> Self {
        self.language = Some(l.into());
        self
    }

    /// Set the rendered byte content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the suggested output path.
    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Record a template-variable dependency path.
    pub fn dependency(mut self, path: impl Into<String>) -> Self {
        self.dependencies.insert(path.into());
        self
    }

    /// Replace the full dependency set.
    pub fn dependencies(mut self, deps: impl IntoIterator<Item = String>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    /// Consume the builder, computing `hash`, `size`, and `id`.
    pub fn build(self) -> Result<Artifact, BuildError> {
        let template_id = self.template_id.ok_or(BuildError::MissingField("template_id"))?;
        let content = self.content.ok_or(BuildError::MissingField("content"))?;
        let hash = canon::sha256_hex(content.as_bytes());
        let id = format!("{template_id}-{}", canon::short_hash(&hash));
        Ok(Artifact {
            id,
            template_id,
            artifact_type: self.artifact_type.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            size: content.len(),
            content,
            hash,
            output_path: self.output_path,
            dependencies: self.dependencies,
        })
    }
}

/// Fluent builder for [`Attestation`].
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct AttestationBuilder {
    format: Option<AttestationFormat>,
    artifact: Option<ArtifactRef>,
    template: Option<TemplateRef>,
    graph: Option<GraphRef>,
    generated_at: Option<String>,
    tool_version: Option<String>,
    timestamp: Option<String>,
    metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl AttestationBuilder {
    /// Start a new builder, defaulting to [`AttestationFormat::Minimal`].
    pub fn new() -> Self {
        Self {
            format: Some(AttestationFormat::Minimal),
            ..Self::default()
        }
    }

    /// Set the attestation format.
    pub fn format(mut self, format: AttestationFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the artifact reference.
    pub fn artifact(mut self, path: impl Into<String>, hash: impl Into<String>) -> Self {
        self.artifact = Some(ArtifactRef {
            path: path.into(),
            hash: hash.into(),
        });
        self
    }

    /// Set the template reference.
    pub fn template(mut self, id: impl Into<String>, hash: impl Into<String>, path: Option<String>) -> Self {
        self.template = Some(TemplateRef {
            id: id.into(),
            hash: hash.into(),
            path,
        });
        self
    }

    /// Set the graph reference.
    pub fn graph(mut self, path: Option<String>, hash: Option<String>) -> Self {
        self.graph = Some(GraphRef { path, hash });
        self
    }

    /// Set the caller-supplied, pinned `generatedAt` timestamp.
    pub fn generated_at(mut self, ts: impl Into<String>) -> Self {
        self.generated_at = Some(ts.into());
        self
    }

    /// Set the engine's tool version (defaults to [`crate::CONTRACT_VERSION`]).
    pub fn tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    /// Set the attestation-level timestamp (defaults to `generated_at`).
    pub fn timestamp(mut self, ts: impl Into<String>) -> Self {
        self.timestamp = Some(ts.into());
        self
    }

    /// Attach full-mode metadata.
    pub fn metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Consume the builder. Signing is the caller's responsibility — this
    /// always produces an unsigned attestation with `integrity` computed
    /// over the canonical `provenance` object.
    pub fn build(self) -> Result<Attestation, BuildError> {
        let artifact = self.artifact.ok_or(BuildError::MissingField("artifact"))?;
        let template = self.template.ok_or(BuildError::MissingField("template"))?;
        let generated_at = self.generated_at.ok_or(BuildError::MissingField("generated_at"))?;
        let timestamp = self.timestamp.unwrap_or_else(|| generated_at.clone());
        let provenance = Provenance {
            artifact,
            template,
            graph: self.graph,
            generated_at,
            tool_version: self.tool_version.unwrap_or_else(|| crate::CONTRACT_VERSION.to_string()),
        };
        let sha256 = canon::hash_value(&provenance).map_err(|_| BuildError::MissingField("provenance"))?;
        Ok(Attestation {
            format: self.format.unwrap_or(AttestationFormat::Minimal),
            provenance,
            timestamp,
            signature: None,
            integrity: Integrity { sha256 },
            metadata: self.metadata,
        })
    }
}

/// Fluent builder for [`TrustPolicy`].
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct TrustPolicyBuilder {
    version: Option<String>,
    trusted_keys: Vec<TrustedKey>,
    trusted_publishers: Vec<String>,
    requirements: Option<TrustRequirements>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl TrustPolicyBuilder {
    /// Start a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy schema version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a trusted signing key.
    pub fn trusted_key(mut self, key: TrustedKey) -> Self {
        self.trusted_keys.push(key);
        self
    }

    /// Add a trusted publisher identity.
    pub fn trusted_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.trusted_publishers.push(publisher.into());
        self
    }

    /// Override the default [`TrustRequirements`].
    pub fn requirements(mut self, requirements: TrustRequirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// Attach free-form metadata.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Consume the builder.
    pub fn build(self) -> Result<TrustPolicy, BuildError> {
        Ok(TrustPolicy {
            version: self.version.ok_or(BuildError::MissingField("version"))?,
            trusted_keys: self.trusted_keys,
            trusted_publishers: self.trusted_publishers,
            requirements: self.requirements.unwrap_or_default(),
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_builder_computes_hash_and_id() {
        let artifact = ArtifactBuilder::new()
            .template_id("svc-template")
            .content("Service: A")
            .build()
            .unwrap();
        assert_eq!(artifact.hash, canon::sha256_hex(b"Service: A"));
        assert!(artifact.id.starts_with("svc-template-"));
        assert_eq!(artifact.size, "Service: A".len());
    }

    #[test]
    fn artifact_builder_requires_content() {
        let err = ArtifactBuilder::new().template_id("t").build().unwrap_err();
        assert_eq!(err, BuildError::MissingField("content"));
    }

    #[test]
    fn attestation_builder_computes_integrity() {
        let att = AttestationBuilder::new()
            .artifact("out/file.rs", "a".repeat(64))
            .template("t1", "b".repeat(64), None)
            .generated_at("2026-01-01T00:00:00Z")
            .build()
            .unwrap();
        assert!(!att.integrity.sha256.is_empty());
        assert!(att.signature.is_none());
        assert_eq!(att.provenance.tool_version, crate::CONTRACT_VERSION);
    }

    #[test]
    fn trust_policy_builder_defaults_requirements() {
        let policy = TrustPolicyBuilder::new().version("1.0").build().unwrap();
        assert_eq!(policy.requirements.minimum_signatures, 1);
    }
}
