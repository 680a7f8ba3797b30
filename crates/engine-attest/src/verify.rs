//! Attestation verification and trust scoring.

use std::sync::Arc;

use engine_core::canon;
use engine_core::model::{Attestation, TrustPolicy};
use tokio::sync::Semaphore;

use crate::error::AttestError;
use crate::keys;
use crate::sign::signing_payload;

/// Extra context that relaxes otherwise-hard policy checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// If true, an expired trusted key reduces (but does not zero) trust
    /// rather than failing the hard-requirement check outright.
    pub allow_expired: bool,
}

/// Outcome of verifying one attestation against its artifact and an
/// optional trust policy.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationResult {
    /// Conjunction of all hard requirements that applied.
    pub valid: bool,
    /// Advisory trust score in `[0, 1]`.
    pub trust_score: f64,
    /// Human-readable reasons `valid` is false. Empty when `valid`.
    pub failures: Vec<String>,
    /// Whether the attestation carried a signature at all.
    pub signed: bool,
    /// Whether the signature (if present) verified.
    pub signature_valid: bool,
    /// Whether the signing key's fingerprint is trusted (no policy → `false`).
    pub key_trusted: bool,
}

/// Verify `attestation` against `artifact_bytes`, optionally enforcing `policy`.
///
/// Step order: integrity, then signature, then policy,
/// then trust score. Integrity and malformed-document failures are fatal
/// ([`Err`]); policy and trust failures are reported in the returned
/// [`VerificationResult`] so batch verification can continue past them.
pub fn verify(
    attestation: &Attestation,
    artifact_bytes: &[u8],
    policy: Option<&TrustPolicy>,
    options: VerifyOptions,
) -> Result<VerificationResult, AttestError> {
    let actual_hash = canon::sha256_hex(artifact_bytes);
    if actual_hash != attestation.provenance.artifact.hash {
        return Err(AttestError::IntegrityFailure(format!(
            "expected {}, got {actual_hash}",
            attestation.provenance.artifact.hash
        )));
    }

    let mut failures = Vec::new();
    let signed = attestation.signature.is_some();
    let mut signature_valid = false;
    let mut fingerprint = None;

    if let Some(signature) = &attestation.signature {
        let payload = signing_payload(attestation);
        match keys::verify_raw(&signature.public_key, &payload, &decode_signature(&signature.value)?) {
            Ok(()) => signature_valid = true,
            Err(e) => return Err(e),
        }
        fingerprint = Some(fingerprint_of_base64(&signature.public_key)?);
    }

    let mut key_trusted = false;
    if let Some(policy) = policy {
        if let Some(signature) = &attestation.signature {
            if !policy.requirements.allowed_algorithms.iter().any(|a| a == &signature.algorithm) {
                failures.push(format!("algorithm {} is not allowed", signature.algorithm));
            }
        }

        if let Some(fp) = &fingerprint {
            match policy.trusted_keys.iter().find(|k| &k.fingerprint == fp) {
                Some(key) => {
                    let expired = is_expired(key, &attestation.timestamp);
                    if expired && !options.allow_expired {
                        failures.push("signing key is outside its validity window".to_string());
                    } else {
                        key_trusted = true;
                    }
                }
                None => failures.push("signing key fingerprint is not trusted".to_string()),
            }
        } else if policy.requirements.require_attestations {
            failures.push("attestation is unsigned".to_string());
        }

        let signature_count = u32::from(signed);
        if signature_count < policy.requirements.minimum_signatures {
            failures.push(format!(
                "{} signature(s) present, {} required",
                signature_count, policy.requirements.minimum_signatures
            ));
        }

        let format_name = format_tag(attestation);
        if !policy.requirements.required_attestation_types.is_empty()
            && !policy.requirements.required_attestation_types.iter().any(|t| t == format_name)
        {
            failures.push(format!("attestation format '{format_name}' is not accepted"));
        }

        if policy.requirements.require_publisher_verification {
            let publisher_trusted = fingerprint
                .as_ref()
                .and_then(|fp| policy.trusted_keys.iter().find(|k| &k.fingerprint == fp))
                .and_then(|k| k.publisher.as_deref())
                .is_some_and(|p| policy.trusted_publishers.iter().any(|tp| tp == p));
            if !publisher_trusted {
                failures.push("publisher identity not independently verified".to_string());
            }
        }

        if policy.requirements.require_attestations && !signed {
            failures.push("policy requires a signed attestation".to_string());
        }
    }

    let attestations_present = !policy.map(|p| p.requirements.require_attestations).unwrap_or(false)
        || signed;
    let trust_score = (if signature_valid { 0.5 } else { 0.0 })
        + (if key_trusted { 0.3 } else { 0.0 })
        + (if attestations_present { 0.2 } else { 0.0 });

    Ok(VerificationResult {
        valid: failures.is_empty(),
        trust_score,
        failures,
        signed,
        signature_valid,
        key_trusted,
    })
}

fn format_tag(attestation: &Attestation) -> &'static str {
    match attestation.format {
        engine_core::model::AttestationFormat::Minimal => "minimal",
        engine_core::model::AttestationFormat::Full => "full",
    }
}

fn is_expired(key: &engine_core::model::TrustedKey, at: &str) -> bool {
    match &key.valid_until {
        Some(until) => at.as_bytes() > until.as_bytes(),
        None => false,
    }
}

fn decode_signature(value: &str) -> Result<Vec<u8>, AttestError> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| AttestError::MalformedAttestation(format!("invalid signature encoding: {e}")))
}

fn fingerprint_of_base64(public_key_b64: &str) -> Result<String, AttestError> {
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(public_key_b64)
        .map_err(|e| AttestError::MalformedAttestation(format!("invalid public key encoding: {e}")))?;
    Ok(canon::sha256_hex(&bytes))
}

/// Aggregate counts from a [`batch_verify`] run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BatchSummary {
    /// Total attestations submitted.
    pub total: usize,
    /// Number whose verification completed without a fatal error.
    pub completed: usize,
    /// Number that completed and were `valid`.
    pub valid: usize,
    /// Number that raised a fatal [`AttestError`] (integrity/malformed/signature).
    pub errored: usize,
}

/// One attestation to verify in a batch, together with its artifact bytes.
pub struct BatchEntry {
    /// Caller-chosen key identifying this entry in the result map (usually a path).
    pub path: String,
    /// The attestation document.
    pub attestation: Attestation,
    /// The on-disk artifact bytes to verify integrity against.
    pub artifact_bytes: Vec<u8>,
}

/// Verify many attestations concurrently, bounded by `concurrency`.
///
/// Partial failure never aborts the batch: each entry's outcome
/// is recorded independently, and the aggregate [`BatchSummary`] reports how
/// many failed fatally versus how many merely failed policy.
pub async fn batch_verify(
    entries: Vec<BatchEntry>,
    policy: Option<Arc<TrustPolicy>>,
    options: VerifyOptions,
    concurrency: usize,
) -> (std::collections::BTreeMap<String, Result<VerificationResult, String>>, BatchSummary) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(entries.len());

    for entry in entries {
        let semaphore = Arc::clone(&semaphore);
        let policy = policy.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let result = verify(&entry.attestation, &entry.artifact_bytes, policy.as_deref(), options);
            (entry.path, result.map_err(|e| e.to_string()))
        }));
    }

    let mut results = std::collections::BTreeMap::new();
    let mut summary = BatchSummary::default();
    for task in tasks {
        summary.total += 1;
        match task.await {
            Ok((path, Ok(result))) => {
                summary.completed += 1;
                if result.valid {
                    summary.valid += 1;
                }
                results.insert(path, Ok(result));
            }
            Ok((path, Err(message))) => {
                summary.errored += 1;
                results.insert(path, Err(message));
            }
            Err(join_error) => {
                summary.errored += 1;
                results.insert(format!("<panicked:{join_error}>"), Err(join_error.to_string()));
            }
        }
    }
    (results, summary)
}
