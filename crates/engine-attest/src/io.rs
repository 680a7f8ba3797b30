//! Reading and atomically writing attestation sidecar files, with
//! tolerance for at least one legacy shape.

use std::path::Path;

use engine_core::model::{Attestation, AttestationFormat, ArtifactRef, GraphRef, Integrity, Provenance, Signature, TemplateRef};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::AttestError;

/// Write `attestation` to `{artifact_path}.attest.json`, atomically.
///
/// Mirrors the temp-file-then-rename pattern used by the content-addressed
/// store: write to a sibling `.tmp-{pid}` file, `sync_all`, then rename.
pub async fn write_attestation(artifact_path: &Path, attestation: &Attestation) -> Result<(), AttestError> {
    let sidecar_path = sidecar_path(artifact_path);
    let body = serde_json::to_vec_pretty(attestation)
        .map_err(|e| AttestError::MalformedAttestation(e.to_string()))?;

    if let Some(parent) = sidecar_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AttestError::MalformedAttestation(format!("creating parent dir: {e}")))?;
    }

    let tmp_path = tmp_path(&sidecar_path);
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| AttestError::MalformedAttestation(format!("writing temp attestation: {e}")))?;
    file.write_all(&body)
        .await
        .map_err(|e| AttestError::MalformedAttestation(format!("writing temp attestation: {e}")))?;
    file.sync_all()
        .await
        .map_err(|e| AttestError::MalformedAttestation(format!("syncing temp attestation: {e}")))?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&tmp_path, &sidecar_path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(AttestError::MalformedAttestation(format!("renaming attestation into place: {e}")));
    }
    tracing::info!(target: "engine.attest", path = %sidecar_path.display(), signed = attestation.signature.is_some(), "wrote attestation");
    Ok(())
}

/// The sidecar path for an artifact at `artifact_path`.
pub fn sidecar_path(artifact_path: &Path) -> std::path::PathBuf {
    let mut os_string = artifact_path.as_os_str().to_owned();
    os_string.push(".attest.json");
    std::path::PathBuf::from(os_string)
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("attestation");
    path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()))
}

/// Read an attestation, accepting the minimal schema and one legacy shape
/// (top-level `generation` / `artifact` sub-objects).
///
/// Returns the translated attestation plus any non-fatal warnings produced
/// during translation (e.g. a legacy document with no `toolVersion`).
pub fn read_attestation(bytes: &[u8]) -> Result<(Attestation, Vec<String>), AttestError> {
    if let Ok(attestation) = serde_json::from_slice::<Attestation>(bytes) {
        return Ok((attestation, Vec::new()));
    }
    let legacy: LegacyAttestation = serde_json::from_slice(bytes)
        .map_err(|e| AttestError::MalformedAttestation(format!("unrecognized attestation shape: {e}")))?;
    Ok(legacy.into_attestation())
}

#[derive(Debug, Deserialize)]
struct LegacyAttestation {
    artifact: ArtifactRef,
    template: TemplateRef,
    #[serde(default)]
    graph: Option<GraphRef>,
    generation: LegacyGeneration,
    #[serde(default)]
    signature: Option<Signature>,
    #[serde(default)]
    integrity: Option<Integrity>,
    #[serde(default)]
    metadata: Option<std::collections::BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct LegacyGeneration {
    at: String,
    #[serde(default, rename = "toolVersion")]
    tool_version: Option<String>,
}

impl LegacyAttestation {
    fn into_attestation(self) -> (Attestation, Vec<String>) {
        let mut warnings = Vec::new();
        let tool_version = self.generation.tool_version.unwrap_or_else(|| {
            warnings.push("legacy attestation has no toolVersion; defaulting to 0.0.0".to_string());
            "0.0.0".to_string()
        });
        let provenance = Provenance {
            artifact: self.artifact,
            template: self.template,
            graph: self.graph,
            generated_at: self.generation.at.clone(),
            tool_version,
        };
        let integrity = self.integrity.unwrap_or_else(|| {
            warnings.push("legacy attestation has no integrity block; recomputing".to_string());
            Integrity {
                sha256: engine_core::canon::hash_value(&provenance).unwrap_or_default(),
            }
        });
        let attestation = Attestation {
            format: AttestationFormat::Minimal,
            timestamp: self.generation.at,
            provenance,
            signature: self.signature,
            integrity,
            metadata: self.metadata,
        };
        (attestation, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::model::AttestationFormat;
    use engine_core::FixedClock;
    use serde_json::json;
    use tempfile::tempdir;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let artifact_path = dir.path().join("out/file.rs");
        let attestation = crate::sign::build(
            crate::sign::AttestInput {
                artifact_path: artifact_path.to_str().unwrap(),
                artifact_hash: &"a".repeat(64),
                template_id: "t1",
                template_hash: &"b".repeat(64),
                template_path: None,
                graph: None,
                format: AttestationFormat::Minimal,
                metadata: None,
            },
            &clock(),
        )
        .unwrap();

        write_attestation(&artifact_path, &attestation).await.unwrap();
        let sidecar = sidecar_path(&artifact_path);
        assert!(sidecar.exists());
        assert!(sidecar.to_string_lossy().ends_with(".attest.json"));

        let bytes = tokio::fs::read(&sidecar).await.unwrap();
        let (read_back, warnings) = read_attestation(&bytes).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(read_back.provenance.artifact.path, attestation.provenance.artifact.path);
    }

    #[test]
    fn legacy_shape_translates_with_default_tool_version_warning() {
        let legacy = json!({
            "artifact": {"path": "out/file.rs", "hash": "a".repeat(64)},
            "template": {"id": "t1", "hash": "b".repeat(64)},
            "generation": {"at": "2026-01-01T00:00:00.000Z"},
        });
        let bytes = serde_json::to_vec(&legacy).unwrap();
        let (attestation, warnings) = read_attestation(&bytes).unwrap();
        assert_eq!(attestation.provenance.tool_version, "0.0.0");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn garbage_bytes_are_malformed_not_a_panic() {
        let err = read_attestation(b"not json at all").unwrap_err();
        assert!(matches!(err, AttestError::MalformedAttestation(_)));
    }
}
