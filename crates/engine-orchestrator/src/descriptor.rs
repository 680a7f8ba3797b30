//! Operation descriptors: `{operationId, type, startedAt, context}`,
//! registered on entry and deregistered on exit.

use std::collections::HashMap;
use std::sync::Mutex;

use engine_core::Clock;
use serde_json::Value;
use uuid::Uuid;

/// Which of the five primary operations a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// `ingest(sources) -> Graph`.
    Ingest,
    /// `generate(graph, templates, overrides) -> Artifact[]`.
    Generate,
    /// `attest(artifact, graph?, template) -> Attestation`.
    Attest,
    /// `verify(attestationPath, artifactPath, trustPolicy?) -> VerificationResult`.
    Verify,
    /// `diff(expected, actual) -> DriftResult`.
    Diff,
}

/// A registered, in-flight operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OperationDescriptor {
    /// Unique id for this run of the operation.
    #[serde(rename = "operationId")]
    pub operation_id: Uuid,
    /// Which operation this is.
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// ISO-8601 UTC start time, via the injected clock.
    #[serde(rename = "startedAt")]
    pub started_at: String,
    /// Caller-supplied diagnostic context (template id, artifact path, ...).
    pub context: Value,
}

/// Tracks in-flight [`OperationDescriptor`]s for introspection and
/// graceful shutdown draining.
#[derive(Default)]
pub struct OperationRegistry {
    operations: Mutex<HashMap<Uuid, OperationDescriptor>>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation, returning its descriptor.
    pub fn register(&self, kind: OperationKind, context: Value, clock: &dyn Clock) -> OperationDescriptor {
        let descriptor = OperationDescriptor {
            operation_id: Uuid::new_v4(),
            kind,
            started_at: clock.now_iso(),
            context,
        };
        self.operations
            .lock()
            .expect("operation registry lock poisoned")
            .insert(descriptor.operation_id, descriptor.clone());
        descriptor
    }

    /// Remove a completed or cancelled operation.
    pub fn deregister(&self, operation_id: Uuid) {
        self.operations.lock().expect("operation registry lock poisoned").remove(&operation_id);
    }

    /// Number of operations currently in flight.
    pub fn len(&self) -> usize {
        self.operations.lock().expect("operation registry lock poisoned").len()
    }

    /// `true` if no operations are in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every in-flight operation, for introspection.
    pub fn snapshot(&self) -> Vec<OperationDescriptor> {
        self.operations.lock().expect("operation registry lock poisoned").values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[test]
    fn register_then_deregister_leaves_registry_empty() {
        let registry = OperationRegistry::new();
        let descriptor = registry.register(OperationKind::Ingest, Value::Null, &clock());
        assert_eq!(registry.len(), 1);
        registry.deregister(descriptor.operation_id);
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_reflects_in_flight_operations() {
        let registry = OperationRegistry::new();
        registry.register(OperationKind::Generate, Value::Null, &clock());
        registry.register(OperationKind::Attest, Value::Null, &clock());
        assert_eq!(registry.snapshot().len(), 2);
    }
}
