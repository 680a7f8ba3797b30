//! The orchestrator: sequences ingest -> render -> hash -> store -> attest,
//! owns in-flight operation state, and surfaces events.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine_attest::{AttestInput, KeyMaterial, VerificationResult, VerifyOptions};
use engine_cas::CasBackend;
use engine_core::model::{AttestationFormat, Attestation, Graph, GraphRef, Template, TrustPolicy};
use engine_core::{ArtifactBuilder, Clock};
use engine_drift::{Comparable, DriftResult, FingerprintCache};
use engine_render::{build_context, extract_dependencies, TemplateRenderer};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::cancel::CancellationToken;
use crate::descriptor::{OperationDescriptor, OperationKind, OperationRegistry};
use crate::error::OrchestratorError;
use crate::event::{Event, EventBus, EventSubscription};
use crate::state::{OrchestratorState, StateMachine};

/// Central orchestrator: owns the CAS backend, renderer, clock, operation
/// registry, and event bus, and exposes the five primary operations.
pub struct Orchestrator {
    state: StateMachine,
    operations: OperationRegistry,
    events: EventBus,
    clock: Arc<dyn Clock>,
    cas: Arc<dyn CasBackend>,
    renderer: Arc<dyn TemplateRenderer>,
    fingerprints: FingerprintCache,
    active: AtomicUsize,
    drained: Notify,
}

impl Orchestrator {
    /// Construct and immediately move to `ready`, publishing [`Event::EngineReady`].
    pub fn new(cas: Arc<dyn CasBackend>, renderer: Arc<dyn TemplateRenderer>, clock: Arc<dyn Clock>) -> Self {
        let orchestrator = Self {
            state: StateMachine::new(),
            operations: OperationRegistry::new(),
            events: EventBus::new(),
            clock,
            cas,
            renderer,
            fingerprints: FingerprintCache::new(),
            active: AtomicUsize::new(0),
            drained: Notify::new(),
        };
        orchestrator
            .state
            .transition(OrchestratorState::Ready)
            .expect("initializing -> ready is always legal");
        orchestrator.events.publish(Event::EngineReady);
        orchestrator
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        self.state.current()
    }

    /// Subscribe to orchestrator events.
    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    /// Snapshot of every in-flight operation.
    pub fn in_flight_operations(&self) -> Vec<OperationDescriptor> {
        self.operations.snapshot()
    }

    /// `ready -> shutting-down -> shutdown`: blocks new operations, waits
    /// for in-flight operations to drain, then clears caches.
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        self.state.transition(OrchestratorState::ShuttingDown)?;
        while self.active.load(Ordering::SeqCst) > 0 {
            self.drained.notified().await;
        }
        self.fingerprints.clear();
        self.state.transition(OrchestratorState::Shutdown)?;
        Ok(())
    }

    async fn guarded<T, F, Fut>(
        &self,
        kind: OperationKind,
        context: Value,
        cancel: &CancellationToken,
        make_fut: F,
    ) -> Result<T, OrchestratorError>
    where
        F: FnOnce(uuid::Uuid) -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        if self.state.current() != OrchestratorState::Ready {
            return Err(OrchestratorError::ShuttingDown);
        }

        let descriptor = self.operations.register(kind, context, &*self.clock);
        self.active.fetch_add(1, Ordering::SeqCst);

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            r = make_fut(descriptor.operation_id) => r,
        };

        self.operations.deregister(descriptor.operation_id);
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }

        if let Err(ref error) = result {
            self.events.publish(Event::Error {
                kind: error.code().as_str().to_string(),
                operation_id: Some(descriptor.operation_id.to_string()),
                detail: error.to_string(),
            });
        }

        result
    }

    /// `ingest(sources) -> Graph` ingests Turtle sources into a graph.
    pub async fn ingest(
        &self,
        sources: &[engine_graph::Source],
        cancel: &CancellationToken,
    ) -> Result<Graph, OrchestratorError> {
        let context = json!({ "sourceCount": sources.len() });
        self.guarded(OperationKind::Ingest, context, cancel, |op_id| async move {
            let op_id = op_id.to_string();
            self.events.publish(Event::IngestionStarted { operation_id: op_id.clone() });
            let graph = engine_graph::ingest(sources, &*self.clock, Some(&op_id))?;
            self.events.publish(Event::IngestionComplete { operation_id: op_id, graph_id: graph.id.clone() });
            Ok(graph)
        })
        .await
    }

    /// `generate(graph, templates, overrides) -> Artifact[]`: renders each
    /// template against the graph and stores the resulting bytes in the
    /// CAS backend.
    pub async fn generate(
        &self,
        graph: &Graph,
        templates: &[Template],
        overrides: &Value,
        cancel: &CancellationToken,
    ) -> Result<Vec<engine_core::model::Artifact>, OrchestratorError> {
        let context_json = json!({ "graphId": graph.id, "templateCount": templates.len() });
        self.guarded(OperationKind::Generate, context_json, cancel, |op_id| async move {
            let op_id = op_id.to_string();
            self.events.publish(Event::GenerationStarted { operation_id: op_id.clone() });
            let context = build_context(graph, overrides);
            let mut artifacts = Vec::with_capacity(templates.len());

            for template in templates {
                let content = self.renderer.render(&template.id, &template.body, &context)?;
                let mut builder = ArtifactBuilder::new()
                    .template_id(&template.id)
                    .artifact_type(&template.template_type)
                    .language(&template.language)
                    .content(content)
                    .dependencies(extract_dependencies(&template.body));
                if let Some(output_path) = &template.output_path {
                    builder = builder.output_path(output_path);
                }
                let artifact = builder.build()?;
                self.cas.store(artifact.content.as_bytes()).await?;
                artifacts.push(artifact);
            }

            let artifact_ids = artifacts.iter().map(|a| a.id.clone()).collect();
            self.events.publish(Event::GenerationComplete { operation_id: op_id, artifact_ids });
            Ok(artifacts)
        })
        .await
    }

    /// `attest(artifact, graph?, template) -> Attestation`: builds and
    /// signs a provenance record for a rendered artifact.
    #[allow(clippy::too_many_arguments)]
    pub async fn attest(
        &self,
        artifact: &engine_core::model::Artifact,
        artifact_path: &str,
        template: &Template,
        template_path: Option<String>,
        graph_ref: Option<GraphRef>,
        key: Option<&KeyMaterial>,
        format: AttestationFormat,
        cancel: &CancellationToken,
    ) -> Result<Attestation, OrchestratorError> {
        let context = json!({ "artifactId": artifact.id, "templateId": template.id });
        self.guarded(OperationKind::Attest, context, cancel, |_op_id| async move {
            let input = AttestInput {
                artifact_path,
                artifact_hash: &artifact.hash,
                template_id: &template.id,
                template_hash: &template.hash,
                template_path,
                graph: graph_ref,
                format,
                metadata: None,
            };
            let attestation = engine_attest::build_attestation(input, &*self.clock)?;
            let attestation = match key {
                Some(key) => engine_attest::sign_attestation(attestation, key),
                None => attestation,
            };
            Ok(attestation)
        })
        .await
    }

    /// `verify(attestationPath, artifactPath, trustPolicy?) -> VerificationResult`.
    pub async fn verify(
        &self,
        attestation: &Attestation,
        artifact_bytes: &[u8],
        policy: Option<&TrustPolicy>,
        options: VerifyOptions,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult, OrchestratorError> {
        let context = json!({ "artifactPath": attestation.provenance.artifact.path });
        self.guarded(OperationKind::Verify, context, cancel, |_op_id| async move {
            Ok(engine_attest::verify(attestation, artifact_bytes, policy, options)?)
        })
        .await
    }

    /// `diff(expected, actual) -> DriftResult`: compares two comparables
    /// and reports semantic drift.
    pub async fn diff(
        &self,
        expected: Option<&Comparable>,
        actual: Option<&Comparable>,
        cancel: &CancellationToken,
    ) -> Result<DriftResult, OrchestratorError> {
        self.guarded(OperationKind::Diff, Value::Null, cancel, |_op_id| async move {
            Ok(engine_drift::diff(expected, actual, &self.fingerprints, &*self.clock))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_cas::MemoryCas;
    use engine_core::FixedClock;
    use engine_render::MinijinjaRenderer;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Arc::new(MemoryCas::new()),
            Arc::new(MinijinjaRenderer::new()),
            Arc::new(FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()),
        )
    }

    #[tokio::test]
    async fn new_orchestrator_is_ready() {
        assert_eq!(orchestrator().state(), OrchestratorState::Ready);
    }

    #[tokio::test]
    async fn ingest_produces_a_graph() {
        let orch = orchestrator();
        let source = engine_graph::Source::turtle(
            b"@prefix ex: <http://example.org/> . ex:a ex:name \"Alice\" .".to_vec(),
        );
        let graph = orch.ingest(&[source], &CancellationToken::new()).await.unwrap();
        assert_eq!(graph.entities.len(), 1);
    }

    #[tokio::test]
    async fn operations_are_rejected_once_shutting_down() {
        let orch = orchestrator();
        orch.shutdown().await.unwrap();
        let err = orch
            .ingest(&[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ShuttingDown));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_an_in_flight_operation() {
        let orch = orchestrator();
        let token = CancellationToken::new();
        token.cancel();
        let err = orch.ingest(&[], &token).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Cancelled));
    }

    #[tokio::test]
    async fn diff_of_identical_text_reports_no_drift() {
        let orch = orchestrator();
        let a = Comparable::Text("same".to_string());
        let b = Comparable::Text("same".to_string());
        let result = orch.diff(Some(&a), Some(&b), &CancellationToken::new()).await.unwrap();
        assert!(!result.has_drift);
    }

    #[tokio::test]
    async fn shutdown_drains_before_completing() {
        let orch = orchestrator();
        orch.shutdown().await.unwrap();
        assert_eq!(orch.state(), OrchestratorState::Shutdown);
    }
}
