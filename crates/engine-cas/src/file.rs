use crate::{CasBackend, CasError, CasMetrics, CasMetricsSnapshot};
use async_trait::async_trait;
use engine_core::canon;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Filesystem CAS backend. Blobs live at
/// `{base}/{hash[0..2]}/{hash[2..]}`; writes go through a temp file in the
/// same directory followed by an atomic rename, so a reader never observes
/// a partially-written blob.
pub struct FileCas {
    base: PathBuf,
    metrics: CasMetrics,
}

impl FileCas {
    /// Root the backend at `base`. The directory is created lazily on
    /// first write, not here.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            metrics: CasMetrics::default(),
        }
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.base.join(&hash[..2]).join(&hash[2..])
    }
}

#[async_trait]
impl CasBackend for FileCas {
    async fn store(&self, bytes: &[u8]) -> Result<String, CasError> {
        let hash = canon::sha256_hex(bytes);
        let path = self.blob_path(&hash);
        if tokio::fs::metadata(&path).await.is_ok() {
            tracing::debug!(target: "engine.cas", hash = %hash, backend = "file", "blob already present");
            return Ok(hash);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = tmp_path(&path);
        {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
        }
        match tokio::fs::rename(&tmp, &path).await {
            Ok(()) => {}
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e.into());
            }
        }
        self.metrics.record_store(bytes.len() as u64);
        tracing::debug!(target: "engine.cas", hash = %hash, backend = "file", "stored blob");
        Ok(hash)
    }

    async fn retrieve(&self, hash: &str) -> Result<Vec<u8>, CasError> {
        let path = self.blob_path(hash);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                self.metrics.record_hit();
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.metrics.record_miss();
                Err(CasError::NotFound {
                    hash: hash.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self, force: bool) -> Result<(), CasError> {
        if !force {
            let non_empty = tokio::fs::metadata(&self.base).await.is_ok()
                && has_any_entry(&self.base).await?;
            if non_empty {
                return Err(CasError::NotEmpty);
            }
        }
        if tokio::fs::metadata(&self.base).await.is_ok() {
            tokio::fs::remove_dir_all(&self.base).await?;
        }
        Ok(())
    }

    fn metrics(&self) -> CasMetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()))
}

async fn has_any_entry(dir: &Path) -> Result<bool, CasError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let cas = FileCas::new(tmp.path());
        let hash = cas.store(b"payload").await.unwrap();
        let back = cas.retrieve(&hash).await.unwrap();
        assert_eq!(back, b"payload");
        let layout = tmp.path().join(&hash[..2]).join(&hash[2..]);
        assert!(layout.exists());
    }

    #[tokio::test]
    async fn store_twice_does_not_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let cas = FileCas::new(tmp.path());
        let h1 = cas.store(b"abc").await.unwrap();
        let h2 = cas.store(b"abc").await.unwrap();
        assert_eq!(h1, h2);
        assert_eq!(cas.metrics().stores, 1);
    }

    #[tokio::test]
    async fn no_temp_files_survive_a_successful_store() {
        let tmp = tempfile::tempdir().unwrap();
        let cas = FileCas::new(tmp.path());
        let hash = cas.store(b"xyz").await.unwrap();
        let dir = tmp.path().join(&hash[..2]);
        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(e) = entries.next_entry().await.unwrap() {
            names.push(e.file_name().to_string_lossy().to_string());
        }
        assert!(names.iter().all(|n| !n.contains(".tmp-")));
    }

    #[tokio::test]
    async fn clear_without_force_on_nonempty_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cas = FileCas::new(tmp.path());
        cas.store(b"x").await.unwrap();
        assert!(matches!(cas.clear(false).await, Err(CasError::NotEmpty)));
        cas.clear(true).await.unwrap();
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cas = FileCas::new(tmp.path());
        let err = cas.retrieve(&"a".repeat(64)).await.unwrap_err();
        assert!(matches!(err, CasError::NotFound { .. }));
    }
}
