//! Difference computation, severity scoring, similarity/drift score, and
//! recommendations. Produces the wire-level [`engine_core::DriftResult`]
//! directly so orchestrator callers get a value ready to attach to a
//! receipt.

use engine_core::canon;
use engine_core::{Clock, Difference, DriftResult, DriftTypes, Recommendation, Severity};

use crate::fingerprint::FingerprintCache;
use crate::input::Comparable;

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 1.0,
        Severity::Major => 0.5,
        Severity::Minor => 0.2,
        Severity::Info => 0.05,
    }
}

fn difference(kind: &str, severity: Severity, description: impl Into<String>) -> Difference {
    Difference { diff_type: kind.to_string(), severity, description: description.into() }
}

fn recommendation(kind: &str, severity: Severity, message: impl Into<String>) -> Recommendation {
    Recommendation { kind: kind.to_string(), severity, message: message.into() }
}

/// Compare `expected` against `actual`, producing a [`DriftResult`].
///
/// Either side may be absent (the `actual-missing` / `expected-missing`
/// cases); both absent degenerates to "no drift".
pub fn diff(
    expected: Option<&Comparable>,
    actual: Option<&Comparable>,
    cache: &FingerprintCache,
    clock: &dyn Clock,
) -> DriftResult {
    let started = std::time::Instant::now();

    let expected_fp = expected.map(|e| cache.fingerprint(e, clock));
    let actual_fp = actual.map(|a| cache.fingerprint(a, clock));

    let mut differences = Vec::new();
    let mut drift_types = DriftTypes::default();

    // Number of independent drift categories evaluated by this comparison,
    // used as the denominator of the weighted mean below: a one-sided
    // presence check is a single category (its severity *is* the score),
    // while a present/present comparison evaluates four independent
    // categories (content, semantic, size, content-type) regardless of how
    // many of them actually fired.
    let categories = match (&expected_fp, &actual_fp) {
        (Some(_), None) | (None, Some(_)) => 1,
        (None, None) => 1,
        (Some(_), Some(_)) => 4,
    };

    match (&expected_fp, &actual_fp) {
        (Some(_), None) => {
            differences.push(difference(
                "actual-missing",
                Severity::Critical,
                "expected artifact is missing from the actual side",
            ));
            drift_types.content = true;
        }
        (None, Some(_)) => {
            differences.push(difference(
                "expected-missing",
                Severity::Critical,
                "actual artifact has no corresponding expected side",
            ));
            drift_types.content = true;
        }
        (None, None) => {}
        (Some(exp), Some(act)) => {
            if exp.content_hash != act.content_hash {
                drift_types.content = true;
                differences.push(difference(
                    "content-changed",
                    Severity::Minor,
                    "raw content differs byte-for-byte",
                ));

                if exp.semantic_hash != act.semantic_hash {
                    drift_types.semantic = true;
                    let severity = if exp.content_type.semantic_change_is_critical()
                        || act.content_type.semantic_change_is_critical()
                    {
                        Severity::Critical
                    } else {
                        Severity::Major
                    };
                    differences.push(difference(
                        "semantic-change",
                        severity,
                        format!("semantic hash differs under {:?} comparison rules", exp.content_type),
                    ));
                }

                if exp.size != act.size {
                    drift_types.size = true;
                    differences.push(difference(
                        "size-changed",
                        Severity::Minor,
                        format!("size changed from {} to {} bytes", exp.size, act.size),
                    ));
                }
            }

            if exp.content_type != act.content_type {
                drift_types.metadata = true;
                differences.push(difference(
                    "content-type-changed",
                    Severity::Info,
                    format!("content type changed from {:?} to {:?}", exp.content_type, act.content_type),
                ));
            }
        }
    }

    let drift_score = weighted_drift_score(&differences, categories);
    let similarity = 1.0 - drift_score;
    let has_drift = !differences.is_empty();

    if has_drift {
        tracing::debug!(
            target: "engine.drift",
            drift_score,
            differences = differences.len(),
            "drift detected"
        );
    }

    let recommendations = recommend(&differences);
    let detection_id = detection_id(&expected_fp, &actual_fp, clock);

    DriftResult {
        detection_id,
        timestamp: clock.now_iso(),
        has_drift,
        similarity,
        drift_score,
        drift_types,
        differences,
        recommendations,
        processing_time_ms: started.elapsed().as_millis() as u64,
    }
}

fn detection_id(
    expected: &Option<crate::fingerprint::Fingerprint>,
    actual: &Option<crate::fingerprint::Fingerprint>,
    clock: &dyn Clock,
) -> String {
    let seed = format!(
        "{}|{}|{}",
        expected.as_ref().map(|f| f.content_hash.as_str()).unwrap_or(""),
        actual.as_ref().map(|f| f.content_hash.as_str()).unwrap_or(""),
        clock.now_iso(),
    );
    canon::sha256_hex(seed.as_bytes())[..16].to_string()
}

/// Weighted mean of per-difference severity scores over the fixed number
/// of `categories` this comparison evaluated (not the number of
/// differences that fired) — so two differences out of four possible ones
/// score lower than one difference that was the only category checked.
fn weighted_drift_score(differences: &[Difference], categories: usize) -> f64 {
    if differences.is_empty() {
        return 0.0;
    }
    let sum: f64 = differences.iter().map(|d| severity_weight(d.severity)).sum();
    (sum / categories.max(1) as f64).clamp(0.0, 1.0)
}

fn recommend(differences: &[Difference]) -> Vec<Recommendation> {
    if differences.is_empty() {
        return vec![recommendation("accept", Severity::Info, "no differences detected")];
    }

    let mut recommendations = Vec::new();

    if differences.iter().any(|d| d.diff_type == "actual-missing") {
        recommendations.push(recommendation(
            "regenerate",
            Severity::Critical,
            "actual artifact is missing; regenerate from the expected source",
        ));
    }
    if differences.iter().any(|d| d.diff_type == "expected-missing") {
        recommendations.push(recommendation(
            "review",
            Severity::Critical,
            "actual artifact has no expected baseline; confirm it is intentional",
        ));
    }
    if differences.iter().any(|d| d.diff_type == "semantic-change" && d.severity == Severity::Critical) {
        recommendations.push(recommendation(
            "review",
            Severity::Critical,
            "a critical semantic change was detected; manual review required before accepting",
        ));
    }
    if differences.iter().all(|d| matches!(d.severity, Severity::Info | Severity::Minor)) {
        recommendations.push(recommendation("accept", Severity::Minor, "only cosmetic differences were detected"));
    }

    if recommendations.is_empty() {
        recommendations.push(recommendation("review", Severity::Major, "differences were detected; review before accepting"));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[test]
    fn identical_inputs_have_zero_drift() {
        let cache = FingerprintCache::new();
        let a = Comparable::Text("same".to_string());
        let b = Comparable::Text("same".to_string());
        let result = diff(Some(&a), Some(&b), &cache, &clock());
        assert!(!result.has_drift);
        assert_eq!(result.drift_score, 0.0);
        assert_eq!(result.similarity, 1.0);
        assert_eq!(result.recommendations[0].kind, "accept");
        assert_eq!(result.detection_id.len(), 16);
    }

    #[test]
    fn missing_actual_is_critical_and_recommends_regenerate() {
        let cache = FingerprintCache::new();
        let a = Comparable::Text("expected body".to_string());
        let result = diff(Some(&a), None, &cache, &clock());
        assert_eq!(result.drift_score, 1.0);
        assert!(result.recommendations.iter().any(|r| r.kind == "regenerate"));
    }

    #[test]
    fn code_semantic_change_is_critical_severity() {
        let cache = FingerprintCache::new();
        let a = Comparable::file("f.rs", b"fn f() { 1 }".to_vec());
        let b = Comparable::file("f.rs", b"fn f() { 2 }".to_vec());
        let result = diff(Some(&a), Some(&b), &cache, &clock());
        let semantic = result.differences.iter().find(|d| d.diff_type == "semantic-change").unwrap();
        assert_eq!(semantic.severity, Severity::Critical);
        assert!(result.drift_types.semantic);
    }

    #[test]
    fn json_key_reorder_has_no_semantic_change_only_content_changed() {
        let cache = FingerprintCache::new();
        let a = Comparable::Text(r#"{"a":1,"b":2}"#.to_string());
        let b = Comparable::Text(r#"{"b":2,"a":1}"#.to_string());
        let result = diff(Some(&a), Some(&b), &cache, &clock());
        assert!(result.differences.iter().any(|d| d.diff_type == "content-changed"));
        assert!(!result.differences.iter().any(|d| d.diff_type == "semantic-change"));
        assert!(result.recommendations.iter().any(|r| r.kind == "accept"));
    }

    #[test]
    fn json_whitespace_only_drift_keeps_similarity_above_point_eight() {
        let cache = FingerprintCache::new();
        let a = Comparable::Text(r#"{"a":1,"b":2}"#.to_string());
        let b = Comparable::Text("{\n  \"a\": 1,\n  \"b\": 2\n}".to_string());
        let result = diff(Some(&a), Some(&b), &cache, &clock());
        assert!(result.has_drift);
        assert!(result.drift_types.content);
        assert!(!result.drift_types.semantic);
        assert!(result.similarity > 0.8, "similarity was {}", result.similarity);
    }

    #[test]
    fn two_diffs_of_the_same_inputs_produce_the_same_detection_id() {
        let cache = FingerprintCache::new();
        let a = Comparable::Text("expected".to_string());
        let b = Comparable::Text("actual".to_string());
        let first = diff(Some(&a), Some(&b), &cache, &clock());
        let second = diff(Some(&a), Some(&b), &cache, &clock());
        assert_eq!(first.detection_id, second.detection_id);
    }
}
