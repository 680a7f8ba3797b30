//! Git-notes-backed receipt storage with a sidecar-directory fallback.

use std::path::{Path, PathBuf};

use engine_core::model::{Attestation, Receipt};

use crate::error::ReceiptStoreError;
use crate::git;

/// Options controlling a [`ReceiptStore::cleanup`] pass.
#[derive(Debug, Clone, Copy)]
pub struct CleanupOptions {
    /// Receipts attached to commits older than this are eligible for removal.
    pub older_than_days: u64,
    /// Always keep at least this many (most recent) receipts per commit.
    pub keep_minimum_per_commit: usize,
}

/// Git-notes receipt store rooted at a working tree, with a fallback
/// sidecar directory used when `root` is not a git repository.
pub struct ReceiptStore {
    root: PathBuf,
    fallback_dir: PathBuf,
}

impl ReceiptStore {
    /// Construct a store rooted at `root`, with the fallback directory
    /// defaulted to `{root}/.engine/artifacts`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let fallback_dir = root.join(".engine").join("artifacts");
        Self { root, fallback_dir }
    }

    /// Override the fallback sidecar directory.
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    /// Whether `root` is usable as a git-notes backing store.
    pub async fn is_git_backed(&self) -> bool {
        git::is_git_repo(&self.root).await
    }

    /// Attach `attestation` as a receipt note on `commit` (or `HEAD` if
    /// `None`). Fails with [`ReceiptStoreError::NotAGitRepository`] when
    /// `root` is not a git working tree; callers may fall back to
    /// [`Self::write_sidecar`].
    pub async fn write(&self, attestation: Attestation, commit: Option<&str>) -> Result<Receipt, ReceiptStoreError> {
        if !self.is_git_backed().await {
            return Err(ReceiptStoreError::NotAGitRepository(self.root.display().to_string()));
        }
        let commit = match commit {
            Some(c) => c.to_string(),
            None => git::resolve_head(&self.root).await?,
        };
        let receipt = Receipt { attestation, commit: commit.clone() };

        let mut receipts = self.get(&commit).await.unwrap_or_default();
        receipts.push(receipt.clone());
        let body = serde_json::to_string(&receipts)
            .map_err(|e| ReceiptStoreError::Malformed(e.to_string()))?;
        git::notes_add(&self.root, &commit, &body).await?;
        tracing::info!(target: "engine.receipt_store", commit = %commit, "wrote receipt note");
        Ok(receipt)
    }

    /// Write `receipt` to the sidecar directory, keyed by its artifact hash.
    pub async fn write_sidecar(&self, receipt: &Receipt) -> Result<(), ReceiptStoreError> {
        tokio::fs::create_dir_all(&self.fallback_dir)
            .await
            .map_err(|e| ReceiptStoreError::Io(e.to_string()))?;
        let path = self.sidecar_path(&receipt.attestation.provenance.artifact.hash);
        let mut receipts = self.read_sidecar(&receipt.attestation.provenance.artifact.hash).await.unwrap_or_default();
        receipts.push(receipt.clone());
        let body = serde_json::to_vec_pretty(&receipts)
            .map_err(|e| ReceiptStoreError::Malformed(e.to_string()))?;
        tokio::fs::write(&path, body).await.map_err(|e| ReceiptStoreError::Io(e.to_string()))?;
        tracing::info!(target: "engine.receipt_store", path = %path.display(), "wrote sidecar receipt");
        Ok(())
    }

    fn sidecar_path(&self, blob_hash: &str) -> PathBuf {
        self.fallback_dir.join(format!("{blob_hash}.json"))
    }

    async fn read_sidecar(&self, blob_hash: &str) -> Result<Vec<Receipt>, ReceiptStoreError> {
        let path = self.sidecar_path(blob_hash);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ReceiptStoreError::Malformed(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ReceiptStoreError::Io(e.to_string())),
        }
    }

    /// All receipts attached to `commit`.
    pub async fn get(&self, commit: &str) -> Result<Vec<Receipt>, ReceiptStoreError> {
        match git::notes_show(&self.root, commit).await? {
            Some(body) => serde_json::from_str(&body).map_err(|e| ReceiptStoreError::Malformed(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// Every commit carrying at least one receipt note, newest first.
    pub async fn list_commits(&self) -> Result<Vec<String>, ReceiptStoreError> {
        Ok(git::notes_list(&self.root).await?.into_iter().map(|(commit, _)| commit).collect())
    }

    /// Receipts whose embedded provenance references `artifact_path` (by
    /// path or by hash), scanning every commit that carries a note.
    pub async fn get_for_artifact(&self, artifact_path: &str) -> Result<Vec<Receipt>, ReceiptStoreError> {
        let mut matches = Vec::new();
        for commit in self.list_commits().await? {
            for receipt in self.get(&commit).await? {
                let artifact = &receipt.attestation.provenance.artifact;
                if artifact.path == artifact_path || artifact.hash == artifact_path {
                    matches.push(receipt);
                }
            }
        }
        Ok(matches)
    }

    /// Remove receipts attached to commits older than `options.older_than_days`,
    /// always preserving the `keep_minimum_per_commit` most recent receipts
    /// (by `attestation.timestamp`) for each affected commit. Returns the
    /// number of receipts removed.
    pub async fn cleanup(&self, options: CleanupOptions) -> Result<usize, ReceiptStoreError> {
        let cutoff = chrono::Utc::now().timestamp() - (options.older_than_days as i64) * 86_400;
        let mut removed = 0usize;
        for (commit, committed_at) in git::notes_list(&self.root).await? {
            if committed_at >= cutoff {
                continue;
            }
            let mut receipts = self.get(&commit).await?;
            if receipts.len() <= options.keep_minimum_per_commit {
                continue;
            }
            receipts.sort_by(|a, b| b.attestation.timestamp.cmp(&a.attestation.timestamp));
            removed += receipts.len() - options.keep_minimum_per_commit;
            receipts.truncate(options.keep_minimum_per_commit);
            if receipts.is_empty() {
                git::notes_remove(&self.root, &commit).await?;
            } else {
                let body = serde_json::to_string(&receipts)
                    .map_err(|e| ReceiptStoreError::Malformed(e.to_string()))?;
                git::notes_add(&self.root, &commit, &body).await?;
            }
        }
        Ok(removed)
    }
}

/// Root directory of the git working tree containing `path`, if any.
pub fn discover_root(path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
