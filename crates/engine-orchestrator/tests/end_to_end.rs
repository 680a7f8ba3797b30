//! End-to-end scenarios against a file-backed CAS: ingest -> generate ->
//! attest -> verify -> diff, the five operations strung together the way a
//! real caller would use them.

use std::sync::Arc;

use engine_attest::{KeyMaterial, VerifyOptions};
use engine_cas::FileCas;
use engine_core::model::{AttestationFormat, Template, TrustedKey};
use engine_core::{FixedClock, TrustPolicyBuilder};
use engine_drift::Comparable;
use engine_orchestrator::{CancellationToken, Orchestrator};
use engine_render::MinijinjaRenderer;

fn orchestrator(base: &std::path::Path) -> Orchestrator {
    Orchestrator::new(
        Arc::new(FileCas::new(base)),
        Arc::new(MinijinjaRenderer::new()),
        Arc::new(FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()),
    )
}

#[tokio::test]
async fn s1_deterministic_generation() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();

    let source = engine_graph::Source::turtle(
        br#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#.to_vec(),
    );
    let graph = orch.ingest(&[source], &token).await.unwrap();
    let template = Template::new("t1", "Service: {{ service.label }}", "doc", "jinja", None);
    let overrides = serde_json::json!({});

    let first = orch.generate(&graph, &[template.clone()], &overrides, &token).await.unwrap();
    let second = orch.generate(&graph, &[template], &overrides, &token).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].content, "Service: A");
    assert_eq!(first[0].hash, second[0].hash);
}

#[tokio::test]
async fn s2_triple_reorder_keeps_the_same_entity_set() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();

    let a = engine_graph::Source::turtle(
        br#"@prefix ex: <http://e/> . ex:s a ex:RESTService . ex:s ex:label "A" . ex:s ex:owner ex:bob ."#
            .to_vec(),
    );
    let b = engine_graph::Source::turtle(
        br#"@prefix ex: <http://e/> . ex:s ex:owner ex:bob . ex:s ex:label "A" . ex:s a ex:RESTService ."#
            .to_vec(),
    );

    let graph_a = orch.ingest(&[a], &token).await.unwrap();
    let graph_b = orch.ingest(&[b], &token).await.unwrap();

    assert_ne!(graph_a.id, graph_b.id);
    assert_eq!(graph_a.entities, graph_b.entities);
}

#[tokio::test]
async fn s3_attest_and_verify_with_a_trusted_key() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();
    let key = KeyMaterial::generate();

    let source = engine_graph::Source::turtle(
        br#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#.to_vec(),
    );
    let graph = orch.ingest(&[source], &token).await.unwrap();
    let template = Template::new("t1", "Service: {{ service.label }}", "doc", "jinja", None);
    let artifacts = orch
        .generate(&graph, &[template.clone()], &serde_json::json!({}), &token)
        .await
        .unwrap();
    let artifact = &artifacts[0];

    let attestation = orch
        .attest(
            artifact,
            "out/service.txt",
            &template,
            None,
            None,
            Some(&key),
            AttestationFormat::Minimal,
            &token,
        )
        .await
        .unwrap();

    let policy = TrustPolicyBuilder::new()
        .version("1.0")
        .trusted_key(TrustedKey {
            fingerprint: key.fingerprint(),
            publisher: None,
            valid_from: None,
            valid_until: None,
        })
        .build()
        .unwrap();

    let result = orch
        .verify(&attestation, artifact.content.as_bytes(), Some(&policy), VerifyOptions::default(), &token)
        .await
        .unwrap();

    assert!(result.valid);
    assert!(result.trust_score >= 0.8);
}

#[tokio::test]
async fn s4_a_tampered_artifact_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();
    let key = KeyMaterial::generate();

    let source = engine_graph::Source::turtle(
        br#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#.to_vec(),
    );
    let graph = orch.ingest(&[source], &token).await.unwrap();
    let template = Template::new("t1", "Service: {{ service.label }}", "doc", "jinja", None);
    let artifacts = orch
        .generate(&graph, &[template.clone()], &serde_json::json!({}), &token)
        .await
        .unwrap();
    let artifact = &artifacts[0];

    let attestation = orch
        .attest(
            artifact,
            "out/service.txt",
            &template,
            None,
            None,
            Some(&key),
            AttestationFormat::Minimal,
            &token,
        )
        .await
        .unwrap();

    let tampered = format!("{} ", artifact.content);
    let err = orch
        .verify(&attestation, tampered.as_bytes(), None, VerifyOptions::default(), &token)
        .await
        .unwrap_err();

    assert_eq!(err.code(), engine_error::ErrorCode::IntegrityMismatch);
    assert!(matches!(err, engine_orchestrator::OrchestratorError::Attest(engine_attest::AttestError::IntegrityFailure(_))));
}

#[tokio::test]
async fn s5_json_whitespace_only_drift_stays_above_point_eight_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();

    let expected = Comparable::Text(r#"{"a":1,"b":2}"#.to_string());
    let actual = Comparable::Text("{\n  \"a\": 1,\n  \"b\": 2\n}".to_string());
    let result = orch.diff(Some(&expected), Some(&actual), &token).await.unwrap();

    assert!(result.has_drift);
    assert!(result.drift_types.content);
    assert!(!result.drift_types.semantic);
    assert!(result.similarity > 0.8);
}

#[tokio::test]
async fn s6_rdf_value_change_is_critical_semantic_drift() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let token = CancellationToken::new();

    let expected = Comparable::file(
        "bob.ttl",
        br#"@prefix ex: <http://e/> . ex:Bob ex:age "25"^^<http://www.w3.org/2001/XMLSchema#integer> ."#.to_vec(),
    );
    let actual = Comparable::file(
        "bob.ttl",
        br#"@prefix ex: <http://e/> . ex:Bob ex:age "30"^^<http://www.w3.org/2001/XMLSchema#integer> ."#.to_vec(),
    );
    let result = orch.diff(Some(&expected), Some(&actual), &token).await.unwrap();

    assert!(result.drift_types.semantic);
    let semantic = result.differences.iter().find(|d| d.diff_type == "semantic-change").unwrap();
    assert_eq!(semantic.severity, engine_core::Severity::Critical);
}
