//! Shared data model: the stable contract every component crate builds on,
//! re-exported from a single module so downstream crates depend on one set
//! of types.

use crate::canon::{self, Hash};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable contract version embedded in provenance defaults and schema checks.
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Kind of RDF object a [`Triple`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ObjectKind {
    /// Object is an IRI.
    #[serde(rename = "IRI")]
    Iri,
    /// Object is a literal value.
    Literal,
    /// Object is a blank node.
    Blank,
}

/// A single RDF triple with a precomputed checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Triple {
    /// Subject IRI or blank node identifier.
    pub subject: String,
    /// Predicate IRI.
    pub predicate: String,
    /// Object lexical form.
    pub object: String,
    /// Kind of the object term.
    pub object_kind: ObjectKind,
    /// Short (16 hex char) SHA-256 of `subject||predicate||object`.
    pub checksum: String,
}

impl Triple {
    /// Construct a triple, computing its checksum.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        object_kind: ObjectKind,
    ) -> Self {
        let subject = subject.into();
        let predicate = predicate.into();
        let object = object.into();
        let checksum = canon::short_hash(&canon::sha256_hex(
            format!("{subject}{predicate}{object}").as_bytes(),
        ))
        .to_string();
        Self {
            subject,
            predicate,
            object,
            object_kind,
            checksum,
        }
    }

    /// Dedup key: `(subject, predicate, object)`.
    pub fn dedup_key(&self) -> (String, String, String) {
        (self.subject.clone(), self.predicate.clone(), self.object.clone())
    }
}

/// A single property value, converted from RDF literal form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PropertyValue {
    /// `xsd:integer`-typed literal, converted to a native integer.
    Integer(i64),
    /// Any other literal or IRI, kept in lexical form.
    Text(String),
}

/// An entity materialized from the graph during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    /// Entity IRI, unique within a [`Graph`].
    pub id: String,
    /// Local name of `rdf:type`, or `"Entity"` if untyped.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Local-name → ordered values. Multiple values preserve insertion
    /// order (duplicate predicates are never overwritten).
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
    /// SHA-256 of the canonical JSON of `{id, type, properties}`.
    pub checksum: String,
}

impl Entity {
    /// Recompute `checksum` from the current `id`/`type`/`properties`.
    pub fn with_checksum(mut self) -> Self {
        #[derive(Serialize)]
        struct Checked<'a> {
            id: &'a str,
            #[serde(rename = "type")]
            entity_type: &'a str,
            properties: &'a BTreeMap<String, Vec<PropertyValue>>,
        }
        let checked = Checked {
            id: &self.id,
            entity_type: &self.entity_type,
            properties: &self.properties,
        };
        self.checksum = canon::hash_value(&checked).unwrap_or_default();
        self
    }

    /// First value of a property, for callers that only want a single
    /// value rather than the full ordered list.
    pub fn first(&self, local_name: &str) -> Option<&PropertyValue> {
        self.properties.get(local_name).and_then(|v| v.first())
    }
}

/// A directed relationship derived when a triple's object is an IRI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    /// Source entity IRI.
    pub from: String,
    /// Target entity IRI.
    pub to: String,
    /// Local name of the predicate.
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Short SHA-256 of `from|type|to`.
    pub checksum: String,
}

impl Relationship {
    /// Construct a relationship, computing its checksum.
    pub fn new(from: impl Into<String>, to: impl Into<String>, relationship_type: impl Into<String>) -> Self {
        let from = from.into();
        let to = to.into();
        let relationship_type = relationship_type.into();
        let checksum = canon::short_hash(&canon::sha256_hex(
            format!("{from}|{relationship_type}|{to}").as_bytes(),
        ))
        .to_string();
        Self {
            from,
            to,
            relationship_type,
            checksum,
        }
    }

    /// Dedup key: `(from, type, to)`.
    pub fn dedup_key(&self) -> (String, String, String) {
        (self.from.clone(), self.relationship_type.clone(), self.to.clone())
    }
}

/// Metadata recorded alongside an ingested [`Graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphMetadata {
    /// Number of input sources that were parsed.
    pub source_count: usize,
    /// ISO-8601 UTC timestamp of ingestion, via the injected clock.
    pub ingested_at: String,
    /// Orchestrator operation id this ingestion ran under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

/// An ingested, deduplicated RDF graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Graph {
    /// SHA-256 of the concatenation of raw source bytes, in input order,
    /// truncated to 16 hex chars.
    pub id: String,
    /// Deduplicated entities, keyed by `id`.
    pub entities: Vec<Entity>,
    /// Deduplicated relationships, keyed by `(from, type, to)`.
    pub relationships: Vec<Relationship>,
    /// All parsed triples in source order, deduplicated by `(s, p, o)`.
    pub triples: Vec<Triple>,
    /// Ingestion metadata.
    pub metadata: GraphMetadata,
}

/// A template definition accepted by the render engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    /// Stable template identifier.
    pub id: String,
    /// Opaque template body.
    pub body: String,
    /// Artifact type this template produces (e.g. `"code"`, `"doc"`).
    #[serde(rename = "type")]
    pub template_type: String,
    /// Template language tag (e.g. `"jinja"`).
    pub language: String,
    /// Suggested output path, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// SHA-256 of `body`.
    pub hash: Hash,
}

impl Template {
    /// Construct a template, computing `hash` from `body`.
    pub fn new(
        id: impl Into<String>,
        body: impl Into<String>,
        template_type: impl Into<String>,
        language: impl Into<String>,
        output_path: Option<String>,
    ) -> Self {
        let body = body.into();
        let hash = canon::sha256_hex(body.as_bytes());
        Self {
            id: id.into(),
            body,
            template_type: template_type.into(),
            language: language.into(),
            output_path,
            hash,
        }
    }
}

/// Rendered output bound to the template that produced it. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Artifact {
    /// `{templateId}-{short(contentHash)}`.
    pub id: String,
    /// Id of the template that produced this artifact.
    pub template_id: String,
    /// Artifact type, copied from the template.
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// Artifact language, copied from the template.
    pub language: String,
    /// Rendered byte content (as UTF-8 text; the render engine never
    /// produces non-UTF-8 output).
    pub content: String,
    /// SHA-256 of `content`.
    pub hash: Hash,
    /// Byte length of `content`.
    pub size: usize,
    /// Suggested output path, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Distinct dotted template-variable paths observed in the body.
    /// Advisory metadata; never affects `hash`.
    pub dependencies: std::collections::BTreeSet<String>,
}

/// Reference to an artifact by path and hash, as embedded in [`Provenance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactRef {
    /// On-disk (or logical) path of the artifact.
    pub path: String,
    /// SHA-256 of the artifact's content.
    pub hash: Hash,
}

/// Reference to the template that produced an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateRef {
    /// Template id.
    pub id: String,
    /// SHA-256 of the template body.
    pub hash: Hash,
    /// Template source path, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Reference to the graph that produced an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphRef {
    /// Graph source path, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Graph id, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
}

/// Minimal provenance record binding artifact, template, and graph by hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Provenance {
    /// Artifact reference.
    pub artifact: ArtifactRef,
    /// Template reference.
    pub template: TemplateRef,
    /// Graph reference, absent when no graph was involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphRef>,
    /// ISO-8601 UTC timestamp, overridable for determinism.
    pub generated_at: String,
    /// Engine version that produced this provenance.
    pub tool_version: String,
}

/// Attestation format: `minimal` carries only [`Provenance`]; `full` adds
/// caller metadata and a reproduction-verification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttestationFormat {
    /// Only the fields in [`Provenance`].
    Minimal,
    /// Adds caller-supplied metadata and integrity/verification detail.
    Full,
}

/// An Ed25519 signature over canonical `provenance` bytes plus `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Signature {
    /// Always `"Ed25519"`.
    pub algorithm: String,
    /// Base64-encoded Ed25519 public key.
    pub public_key: String,
    /// Base64-encoded signature bytes.
    pub value: String,
    /// Fields covered by the signature.
    pub signed_fields: Vec<String>,
}

/// Integrity checksum block: SHA-256 of the canonical `provenance` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Integrity {
    /// SHA-256 hex digest of canonical `provenance`.
    pub sha256: Hash,
}

/// A signed provenance record, written as `{artifactPath}.attest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Attestation {
    /// Attestation schema variant.
    pub format: AttestationFormat,
    /// The provenance payload.
    pub provenance: Provenance,
    /// ISO-8601 UTC timestamp of attestation creation.
    pub timestamp: String,
    /// Ed25519 signature, absent when signing was skipped (no key material).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Integrity checksum of `provenance`.
    pub integrity: Integrity,
    /// Full-mode only: arbitrary caller-supplied metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// A signed attestation stored as a note against a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Receipt {
    /// The attested provenance record.
    pub attestation: Attestation,
    /// Commit the receipt is attached to.
    pub commit: String,
}

/// A trusted signing key entry within a [`TrustPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustedKey {
    /// SHA-256 of the DER-encoded public key, lowercase hex.
    pub fingerprint: String,
    /// Associated publisher identity, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Start of the key's validity window (ISO-8601 UTC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    /// End of the key's validity window (ISO-8601 UTC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

/// Hard requirements a [`TrustPolicy`] enforces as a conjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustRequirements {
    /// Minimum number of valid signatures required.
    pub minimum_signatures: u32,
    /// Algorithms accepted (e.g. `["Ed25519"]`).
    pub allowed_algorithms: Vec<String>,
    /// Whether an attestation must be present at all.
    pub require_attestations: bool,
    /// Attestation `type`/format values that are acceptable.
    pub required_attestation_types: Vec<String>,
    /// Whether the publisher identity must be independently verified.
    pub require_publisher_verification: bool,
}

impl Default for TrustRequirements {
    fn default() -> Self {
        Self {
            minimum_signatures: 1,
            allowed_algorithms: vec!["Ed25519".to_string()],
            require_attestations: true,
            required_attestation_types: vec!["minimal".to_string(), "full".to_string()],
            require_publisher_verification: false,
        }
    }
}

/// Declarative document governing which signatures/publishers/algorithms
/// are accepted during attestation verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustPolicy {
    /// Policy schema version.
    pub version: String,
    /// Keys trusted for signing.
    pub trusted_keys: Vec<TrustedKey>,
    /// Publishers trusted regardless of key fingerprint.
    pub trusted_publishers: Vec<String>,
    /// Hard requirements.
    pub requirements: TrustRequirements,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Severity of an individual difference or recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No action needed.
    Info,
    /// Cosmetic only.
    Minor,
    /// Behavior-relevant change.
    Major,
    /// Likely breaking / security-relevant change.
    Critical,
}

/// A single detected difference between expected and actual artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Difference {
    /// Kind of difference (`"actual-missing"`, `"content-changed"`, ...).
    #[serde(rename = "type")]
    pub diff_type: String,
    /// Severity bucket.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
}

/// A rule-based recommendation attached to a [`DriftResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    /// Recommendation category (e.g. `"semantic-drift"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Severity bucket driving this recommendation.
    pub severity: Severity,
    /// Human-readable action text.
    pub message: String,
}

/// Which drift dimensions were observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DriftTypes {
    /// Byte content differs.
    pub content: bool,
    /// Semantic hash differs.
    pub semantic: bool,
    /// Structural shape differs (reserved for future structural diffing).
    pub structure: bool,
    /// Metadata differs (reserved).
    pub metadata: bool,
    /// Size differs.
    pub size: bool,
}

/// Structured output of comparing an expected artifact against an actual one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DriftResult {
    /// Unique id for this detection run.
    pub detection_id: String,
    /// ISO-8601 UTC timestamp of the comparison.
    pub timestamp: String,
    /// Whether any drift was detected.
    pub has_drift: bool,
    /// Similarity in `[0,1]`; `1.0` means identical.
    pub similarity: f64,
    /// `1 - similarity`, clamped to `[0,1]`.
    pub drift_score: f64,
    /// Which dimensions differed.
    pub drift_types: DriftTypes,
    /// Individual differences found.
    pub differences: Vec<Difference>,
    /// Rule-based recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Wall-clock time the comparison took, in milliseconds.
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_checksum_is_deterministic() {
        let a = Triple::new("s", "p", "o", ObjectKind::Iri);
        let b = Triple::new("s", "p", "o", ObjectKind::Iri);
        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.checksum.len(), 16);
    }

    #[test]
    fn entity_checksum_changes_with_properties() {
        let mut props = BTreeMap::new();
        props.insert("label".to_string(), vec![PropertyValue::Text("A".into())]);
        let e1 = Entity {
            id: "ex:s".into(),
            entity_type: "RESTService".into(),
            properties: props.clone(),
            checksum: String::new(),
        }
        .with_checksum();

        props.insert("label".to_string(), vec![PropertyValue::Text("B".into())]);
        let e2 = Entity {
            id: "ex:s".into(),
            entity_type: "RESTService".into(),
            properties: props,
            checksum: String::new(),
        }
        .with_checksum();

        assert_ne!(e1.checksum, e2.checksum);
    }

    #[test]
    fn entity_first_projects_single_value() {
        let mut props = BTreeMap::new();
        props.insert(
            "label".to_string(),
            vec![PropertyValue::Text("A".into()), PropertyValue::Text("B".into())],
        );
        let e = Entity {
            id: "ex:s".into(),
            entity_type: "Entity".into(),
            properties: props,
            checksum: String::new(),
        };
        assert_eq!(e.first("label"), Some(&PropertyValue::Text("A".into())));
    }

    #[test]
    fn relationship_dedup_key_is_subject_predicate_object() {
        let r = Relationship::new("a", "b", "uses");
        assert_eq!(r.dedup_key(), ("a".to_string(), "uses".to_string(), "b".to_string()));
    }

    #[test]
    fn trust_requirements_default_requires_one_signature() {
        assert_eq!(TrustRequirements::default().minimum_signatures, 1);
    }
}
