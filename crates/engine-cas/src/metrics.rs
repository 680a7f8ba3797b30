use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a CAS backend's counters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CasMetricsSnapshot {
    /// Total `store` calls.
    pub stores: u64,
    /// Total `retrieve` calls.
    pub retrievals: u64,
    /// `retrieve` calls that found an existing blob.
    pub hits: u64,
    /// `retrieve` calls that missed.
    pub misses: u64,
    /// Total bytes ever written via `store`.
    pub bytes_stored: u64,
    /// `hits / (hits + misses)` as a percentage; `0.0` with no retrievals.
    pub hit_rate: f64,
}

/// Atomic counters backing a [`CasMetricsSnapshot`].
#[derive(Debug, Default)]
pub struct CasMetrics {
    stores: AtomicU64,
    retrievals: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    bytes_stored: AtomicU64,
}

impl CasMetrics {
    pub(crate) fn record_store(&self, bytes: u64) {
        self.stores.fetch_add(1, Ordering::Relaxed);
        self.bytes_stored.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.retrievals.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.retrievals.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot.
    pub fn snapshot(&self) -> CasMetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        };
        CasMetricsSnapshot {
            stores: self.stores.load(Ordering::Relaxed),
            retrievals: self.retrievals.load(Ordering::Relaxed),
            hits,
            misses,
            bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}
