//! Field-level diffing of two [`Attestation`]s.

use engine_core::model::Attestation;

/// A single field difference between two attestations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    /// Dot-separated field path (e.g. `"provenance.artifact.hash"`).
    pub field: String,
    /// Serialized old value.
    pub old: String,
    /// Serialized new value.
    pub new: String,
}

/// The result of comparing two attestations field by field.
#[derive(Debug, Clone)]
pub struct AttestationDiff {
    /// Individual field differences. Empty if the attestations are equivalent.
    pub changes: Vec<FieldDiff>,
}

impl AttestationDiff {
    /// Returns `true` if there are no differences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of differing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Compare two attestations field by field and return all differences.
///
/// Mirrors the field-by-field receipt diff this crate's verification
/// pipeline descends from: every semantically meaningful field is compared
/// individually rather than via a single whole-document equality check, so
/// callers can report *which* field drifted.
pub fn diff_attestations(a: &Attestation, b: &Attestation) -> AttestationDiff {
    let mut changes = Vec::new();

    if a.format != b.format {
        changes.push(FieldDiff {
            field: "format".into(),
            old: format!("{:?}", a.format),
            new: format!("{:?}", b.format),
        });
    }

    if a.provenance.artifact.path != b.provenance.artifact.path {
        changes.push(FieldDiff {
            field: "provenance.artifact.path".into(),
            old: a.provenance.artifact.path.clone(),
            new: b.provenance.artifact.path.clone(),
        });
    }

    if a.provenance.artifact.hash != b.provenance.artifact.hash {
        changes.push(FieldDiff {
            field: "provenance.artifact.hash".into(),
            old: a.provenance.artifact.hash.clone(),
            new: b.provenance.artifact.hash.clone(),
        });
    }

    if a.provenance.template.hash != b.provenance.template.hash {
        changes.push(FieldDiff {
            field: "provenance.template.hash".into(),
            old: a.provenance.template.hash.clone(),
            new: b.provenance.template.hash.clone(),
        });
    }

    diff_json_field(&mut changes, "provenance.graph", &a.provenance.graph, &b.provenance.graph);

    if a.provenance.generated_at != b.provenance.generated_at {
        changes.push(FieldDiff {
            field: "provenance.generatedAt".into(),
            old: a.provenance.generated_at.clone(),
            new: b.provenance.generated_at.clone(),
        });
    }

    if a.provenance.tool_version != b.provenance.tool_version {
        changes.push(FieldDiff {
            field: "provenance.toolVersion".into(),
            old: a.provenance.tool_version.clone(),
            new: b.provenance.tool_version.clone(),
        });
    }

    if a.signature.is_some() != b.signature.is_some() {
        changes.push(FieldDiff {
            field: "signature.present".into(),
            old: a.signature.is_some().to_string(),
            new: b.signature.is_some().to_string(),
        });
    }

    if a.integrity.sha256 != b.integrity.sha256 {
        changes.push(FieldDiff {
            field: "integrity.sha256".into(),
            old: a.integrity.sha256.clone(),
            new: b.integrity.sha256.clone(),
        });
    }

    diff_json_field(&mut changes, "metadata", &a.metadata, &b.metadata);

    AttestationDiff { changes }
}

fn diff_json_field<T: serde::Serialize>(changes: &mut Vec<FieldDiff>, name: &str, a: &T, b: &T) {
    let ja = serde_json::to_string(a).unwrap_or_default();
    let jb = serde_json::to_string(b).unwrap_or_default();
    if ja != jb {
        changes.push(FieldDiff {
            field: name.into(),
            old: ja,
            new: jb,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::{build, AttestInput};
    use engine_core::model::AttestationFormat;
    use engine_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    fn attestation(hash: &str) -> Attestation {
        build(
            AttestInput {
                artifact_path: "out/file.rs",
                artifact_hash: hash,
                template_id: "t1",
                template_hash: &"b".repeat(64),
                template_path: None,
                graph: None,
                format: AttestationFormat::Minimal,
                metadata: None,
            },
            &clock(),
        )
        .unwrap()
    }

    #[test]
    fn identical_attestations_have_no_diff() {
        let a = attestation(&"a".repeat(64));
        let b = a.clone();
        assert!(diff_attestations(&a, &b).is_empty());
    }

    #[test]
    fn differing_artifact_hash_is_reported() {
        let a = attestation(&"a".repeat(64));
        let b = attestation(&"c".repeat(64));
        let diff = diff_attestations(&a, &b);
        assert!(diff.changes.iter().any(|d| d.field == "provenance.artifact.hash"));
    }
}
