//! Building and signing [`Attestation`] documents.

use engine_core::canon;
use engine_core::model::{Attestation, AttestationFormat, GraphRef, Signature};
use engine_core::{AttestationBuilder, Clock};

use crate::keys::KeyMaterial;

/// Everything needed to build an attestation for one rendered artifact.
pub struct AttestInput<'a> {
    /// Output path the artifact was (or will be) written to.
    pub artifact_path: &'a str,
    /// SHA-256 of the artifact's content.
    pub artifact_hash: &'a str,
    /// Id of the producing template.
    pub template_id: &'a str,
    /// SHA-256 of the template body.
    pub template_hash: &'a str,
    /// Path the template was loaded from, if known.
    pub template_path: Option<String>,
    /// Source graph, if one was involved in generation.
    pub graph: Option<GraphRef>,
    /// Attestation format.
    pub format: AttestationFormat,
    /// Full-mode caller metadata.
    pub metadata: Option<std::collections::BTreeMap<String, serde_json::Value>>,
}

/// Build an unsigned [`Attestation`] from `input`, timestamped via `clock`.
pub fn build(input: AttestInput<'_>, clock: &dyn Clock) -> Result<Attestation, crate::error::AttestError> {
    let now = clock.now_iso();
    let mut builder = AttestationBuilder::new()
        .format(input.format)
        .artifact(input.artifact_path, input.artifact_hash)
        .template(input.template_id, input.template_hash, input.template_path)
        .generated_at(now);
    if let Some(graph) = input.graph {
        builder = builder.graph(graph.path, graph.hash);
    }
    if let Some(metadata) = input.metadata {
        builder = builder.metadata(metadata);
    }
    builder
        .build()
        .map_err(|e| crate::error::AttestError::MalformedAttestation(e.to_string()))
}

/// The exact byte sequence a signature covers: canonical JSON of
/// `provenance` followed by a newline and the attestation `timestamp`.
pub fn signing_payload(attestation: &Attestation) -> Vec<u8> {
    let value = serde_json::to_value(&attestation.provenance).unwrap_or(serde_json::Value::Null);
    let canon = canon::canonicalize(&value);
    let mut bytes = serde_json::to_vec(&canon).unwrap_or_default();
    bytes.push(b'\n');
    bytes.extend_from_slice(attestation.timestamp.as_bytes());
    bytes
}

/// Sign `attestation` in place with `key`. Callers with no key material
/// simply skip this step and write the attestation unsigned.
pub fn sign(mut attestation: Attestation, key: &KeyMaterial) -> Attestation {
    let payload = signing_payload(&attestation);
    let signature = key.sign(&payload);
    attestation.signature = Some(Signature {
        algorithm: "Ed25519".to_string(),
        public_key: key.public_key_base64(),
        value: base64_encode(&signature),
        signed_fields: vec!["provenance".to_string(), "timestamp".to_string()],
    });
    attestation
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[test]
    fn build_produces_unsigned_attestation_with_integrity() {
        let artifact_hash = "a".repeat(64);
        let template_hash = "b".repeat(64);
        let input = AttestInput {
            artifact_path: "out/file.rs",
            artifact_hash: &artifact_hash,
            template_id: "t1",
            template_hash: &template_hash,
            template_path: None,
            graph: None,
            format: AttestationFormat::Minimal,
            metadata: None,
        };
        let attestation = build(input, &clock()).unwrap();
        assert!(attestation.signature.is_none());
        assert!(!attestation.integrity.sha256.is_empty());
    }

    #[test]
    fn signing_attaches_a_verifiable_signature() {
        let artifact_hash = "a".repeat(64);
        let template_hash = "b".repeat(64);
        let input = AttestInput {
            artifact_path: "out/file.rs",
            artifact_hash: &artifact_hash,
            template_id: "t1",
            template_hash: &template_hash,
            template_path: None,
            graph: None,
            format: AttestationFormat::Minimal,
            metadata: None,
        };
        let attestation = build(input, &clock()).unwrap();
        let key = KeyMaterial::generate();
        let signed = sign(attestation, &key);
        let sig = signed.signature.as_ref().unwrap();
        assert_eq!(sig.algorithm, "Ed25519");
        assert_eq!(sig.public_key, key.public_key_base64());
    }

    #[test]
    fn signing_payload_changes_when_timestamp_changes() {
        let artifact_hash = "a".repeat(64);
        let template_hash = "b".repeat(64);
        let input = AttestInput {
            artifact_path: "out/file.rs",
            artifact_hash: &artifact_hash,
            template_id: "t1",
            template_hash: &template_hash,
            template_path: None,
            graph: None,
            format: AttestationFormat::Minimal,
            metadata: None,
        };
        let a = build(input, &clock()).unwrap();
        let mut b = a.clone();
        b.timestamp = "2099-01-01T00:00:00.000Z".to_string();
        assert_ne!(signing_payload(&a), signing_payload(&b));
    }
}
