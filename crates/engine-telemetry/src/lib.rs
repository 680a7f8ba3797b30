//! Structured operation metrics for the artifact engine, collected
//! independently of the `engine_cas::CasMetrics` counters each backend
//! already tracks internally.
//!
//! An embedding binary wraps each orchestrator call with
//! [`MetricsCollector::record`]; nothing in `engine-orchestrator` depends on
//! this crate, leaving metrics collection to the caller rather than
//! threading it through every component.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// OperationMetrics
// ---------------------------------------------------------------------------

/// Metrics captured for a single orchestrator operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationMetrics {
    /// Which operation ran (`"ingest"`, `"generate"`, `"attest"`,
    /// `"verify"`, `"diff"`).
    pub operation: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the operation completed successfully.
    pub succeeded: bool,
    /// The `ErrorCode` string, if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

// ---------------------------------------------------------------------------
// MetricsSummary
// ---------------------------------------------------------------------------

/// Aggregated statistics across multiple recorded operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    /// Number of operations recorded.
    pub count: usize,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: f64,
    /// Median (p50) duration in milliseconds.
    pub p50_duration_ms: f64,
    /// 99th-percentile duration in milliseconds.
    pub p99_duration_ms: f64,
    /// Failure rate (failed / total).
    pub error_rate: f64,
    /// Per-operation-kind run counts (deterministic ordering).
    pub operation_counts: BTreeMap<String, usize>,
}

impl Default for MetricsSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean_duration_ms: 0.0,
            p50_duration_ms: 0.0,
            p99_duration_ms: 0.0,
            error_rate: 0.0,
            operation_counts: BTreeMap::new(),
        }
    }
}

/// Compute a percentile value from a **sorted** slice.
fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

// ---------------------------------------------------------------------------
// MetricsCollector
// ---------------------------------------------------------------------------

/// Thread-safe collector for [`OperationMetrics`].
///
/// Wrap in an `Arc` (or clone, since the inner storage is already an `Arc`)
/// to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Vec<OperationMetrics>>>,
}

impl MetricsCollector {
    /// Create a new, empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed operation's metrics.
    pub fn record(&self, metrics: OperationMetrics) {
        tracing::debug!(
            target: "engine.telemetry",
            operation = %metrics.operation,
            duration_ms = metrics.duration_ms,
            succeeded = metrics.succeeded,
            "operation recorded"
        );
        self.inner.lock().expect("metrics lock poisoned").push(metrics);
    }

    /// Return all recorded operation metrics.
    pub fn operations(&self) -> Vec<OperationMetrics> {
        self.inner.lock().expect("metrics lock poisoned").clone()
    }

    /// Number of operations recorded so far.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("metrics lock poisoned").len()
    }

    /// Whether the collector has no recorded operations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all recorded metrics.
    pub fn clear(&self) {
        self.inner.lock().expect("metrics lock poisoned").clear();
    }

    /// Compute an aggregated summary of all recorded operations.
    pub fn summary(&self) -> MetricsSummary {
        let data = self.inner.lock().expect("metrics lock poisoned");
        if data.is_empty() {
            return MetricsSummary::default();
        }

        let count = data.len();
        let mut durations: Vec<u64> = data.iter().map(|m| m.duration_ms).collect();
        durations.sort_unstable();

        let total_duration: u64 = durations.iter().sum();
        let mean_duration_ms = total_duration as f64 / count as f64;
        let p50_duration_ms = percentile(&durations, 50.0);
        let p99_duration_ms = percentile(&durations, 99.0);

        let failures = data.iter().filter(|m| !m.succeeded).count();
        let error_rate = failures as f64 / count as f64;

        let mut operation_counts: BTreeMap<String, usize> = BTreeMap::new();
        for m in data.iter() {
            *operation_counts.entry(m.operation.clone()).or_insert(0) += 1;
        }

        MetricsSummary { count, mean_duration_ms, p50_duration_ms, p99_duration_ms, error_rate, operation_counts }
    }
}

// ---------------------------------------------------------------------------
// TelemetryExporter
// ---------------------------------------------------------------------------

/// Exports a [`MetricsSummary`] to some sink.
pub trait TelemetryExporter: Send + Sync {
    /// Export the given summary. Returns the serialized output on success.
    fn export(&self, summary: &MetricsSummary) -> Result<String, String>;
}

/// Exports metrics as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonExporter;

impl TelemetryExporter for JsonExporter {
    fn export(&self, summary: &MetricsSummary) -> Result<String, String> {
        serde_json::to_string_pretty(summary).map_err(|e| e.to_string())
    }
}

/// Log the span of an operation via `tracing::info!`, mirroring the
/// `target:` convention every other component crate uses.
pub fn emit_span(operation: &str, attributes: &BTreeMap<String, String>) {
    info!(target: "engine.telemetry", operation = %operation, attributes = ?attributes, "operation span");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(operation: &str, duration_ms: u64, succeeded: bool) -> OperationMetrics {
        OperationMetrics {
            operation: operation.to_string(),
            duration_ms,
            succeeded,
            error_code: if succeeded { None } else { Some("RENDER_FAILED".to_string()) },
        }
    }

    #[test]
    fn collector_new_is_empty() {
        let c = MetricsCollector::new();
        assert!(c.is_empty());
    }

    #[test]
    fn collector_record_and_len() {
        let c = MetricsCollector::new();
        c.record(sample("ingest", 10, true));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn empty_collector_summary() {
        let c = MetricsCollector::new();
        let s = c.summary();
        assert_eq!(s.count, 0);
        assert_eq!(s.error_rate, 0.0);
    }

    #[test]
    fn summary_mean_and_percentiles() {
        let c = MetricsCollector::new();
        for d in [10, 20, 30, 40, 50] {
            c.record(sample("generate", d, true));
        }
        let s = c.summary();
        assert!((s.mean_duration_ms - 30.0).abs() < f64::EPSILON);
        assert!((s.p50_duration_ms - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_error_rate() {
        let c = MetricsCollector::new();
        c.record(sample("attest", 5, true));
        c.record(sample("attest", 5, false));
        let s = c.summary();
        assert!((s.error_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_operation_counts() {
        let c = MetricsCollector::new();
        c.record(sample("diff", 1, true));
        c.record(sample("diff", 1, true));
        c.record(sample("verify", 1, true));
        let s = c.summary();
        assert_eq!(s.operation_counts["diff"], 2);
        assert_eq!(s.operation_counts["verify"], 1);
    }

    #[test]
    fn clear_empties_the_collector() {
        let c = MetricsCollector::new();
        c.record(sample("ingest", 1, true));
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn json_exporter_round_trips_through_value() {
        let c = MetricsCollector::new();
        c.record(sample("ingest", 42, true));
        let summary = c.summary();
        let exporter = JsonExporter;
        let json = exporter.export(&summary).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["count"], 1);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[7], 99.0), 7.0);
    }

    #[test]
    fn percentile_empty_is_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
