//! Verifying a stored [`Receipt`] by delegating to the attestation
//! subsystem's own verification pipeline on the embedded attestation.

use engine_attest::{verify as verify_attestation, AttestError, VerificationResult, VerifyOptions};
use engine_core::model::{Receipt, TrustPolicy};

/// Verify `receipt.attestation` against `artifact_bytes`.
pub fn verify_receipt(
    receipt: &Receipt,
    artifact_bytes: &[u8],
    policy: Option<&TrustPolicy>,
    options: VerifyOptions,
) -> Result<VerificationResult, AttestError> {
    verify_attestation(&receipt.attestation, artifact_bytes, policy, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::model::{ArtifactRef, AttestationFormat, GraphRef, Integrity, Provenance, TemplateRef};
    use engine_core::{canon, Attestation};

    #[test]
    fn verify_receipt_delegates_to_attestation_verification() {
        let hash = canon::sha256_hex(b"body");
        let provenance = Provenance {
            artifact: ArtifactRef { path: "out/file.rs".to_string(), hash: hash.clone() },
            template: TemplateRef { id: "t1".to_string(), hash: "b".repeat(64), path: None },
            graph: None::<GraphRef>,
            generated_at: "2026-01-01T00:00:00.000Z".to_string(),
            tool_version: "1.0.0".to_string(),
        };
        let attestation = Attestation {
            format: AttestationFormat::Minimal,
            integrity: Integrity { sha256: canon::hash_value(&provenance).unwrap() },
            provenance,
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            signature: None,
            metadata: None,
        };
        let receipt = Receipt { attestation, commit: "deadbeef".to_string() };
        let result = verify_receipt(&receipt, b"body", None, VerifyOptions::default()).unwrap();
        assert!(!result.signed);
    }
}
