use crate::{CasBackend, CasError, CasMetrics, CasMetricsSnapshot};
use async_trait::async_trait;
use engine_core::canon;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory CAS backend: a mapping from hash to owned byte buffer.
#[derive(Default)]
pub struct MemoryCas {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    metrics: CasMetrics,
}

impl MemoryCas {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CasBackend for MemoryCas {
    async fn store(&self, bytes: &[u8]) -> Result<String, CasError> {
        let hash = canon::sha256_hex(bytes);
        let mut blobs = self.blobs.lock().await;
        let was_new = !blobs.contains_key(&hash);
        blobs.entry(hash.clone()).or_insert_with(|| bytes.to_vec());
        if was_new {
            self.metrics.record_store(bytes.len() as u64);
        }
        tracing::debug!(target: "engine.cas", hash = %hash, backend = "memory", "stored blob");
        Ok(hash)
    }

    async fn retrieve(&self, hash: &str) -> Result<Vec<u8>, CasError> {
        let blobs = self.blobs.lock().await;
        match blobs.get(hash) {
            Some(bytes) => {
                self.metrics.record_hit();
                Ok(bytes.clone())
            }
            None => {
                self.metrics.record_miss();
                Err(CasError::NotFound {
                    hash: hash.to_string(),
                })
            }
        }
    }

    async fn clear(&self, force: bool) -> Result<(), CasError> {
        let mut blobs = self.blobs.lock().await;
        if !force && !blobs.is_empty() {
            return Err(CasError::NotEmpty);
        }
        blobs.clear();
        Ok(())
    }

    fn metrics(&self) -> CasMetricsSnapshot {
        self.metrics.snapshot()
    }
}
