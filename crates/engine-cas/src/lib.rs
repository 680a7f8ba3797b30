// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content-addressed blob store: store/retrieve/verify bytes keyed by
//! their SHA-256 hash, with in-memory and filesystem backends and
//! per-backend metrics.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod metrics;

pub use error::CasError;
pub use file::FileCas;
pub use memory::MemoryCas;
pub use metrics::{CasMetrics, CasMetricsSnapshot};

use async_trait::async_trait;
use engine_core::Hash;

/// Uniform contract for a content-addressed blob backend.
#[async_trait]
pub trait CasBackend: Send + Sync {
    /// Store `bytes`, returning its SHA-256 hash. Idempotent: storing the
    /// same bytes twice returns the same hash and does not duplicate data.
    async fn store(&self, bytes: &[u8]) -> Result<Hash, CasError>;

    /// Retrieve the bytes for `hash`. Fails [`CasError::NotFound`] if absent.
    async fn retrieve(&self, hash: &str) -> Result<Vec<u8>, CasError>;

    /// Check whether `bytes` hashes to `hash`. Not constant-time — these
    /// are non-secret content hashes.
    async fn verify(&self, hash: &str, bytes: &[u8]) -> Result<bool, CasError> {
        Ok(engine_core::canon::sha256_hex(bytes) == hash)
    }

    /// Remove all entries. `force=false` on a non-empty disk backend fails
    /// with [`CasError::NotEmpty`].
    async fn clear(&self, force: bool) -> Result<(), CasError>;

    /// Current metrics snapshot.
    fn metrics(&self) -> CasMetricsSnapshot;
}

/// Closed CAS backend selection, mirroring the `CasConfig` shape used for
/// configuration loading.
#[derive(Debug, Clone)]
pub enum CasConfig {
    /// In-memory backend; contents do not survive process restart.
    Memory,
    /// Filesystem backend rooted at `base_path`.
    File {
        /// Root directory; blobs live at `{base_path}/{hash[0..2]}/{hash[2..]}`.
        base_path: std::path::PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verify_matches_content_hash() {
        let cas = MemoryCas::new();
        let hash = cas.store(b"hello").await.unwrap();
        assert!(cas.verify(&hash, b"hello").await.unwrap());
        assert!(!cas.verify(&hash, b"other").await.unwrap());
    }
}
