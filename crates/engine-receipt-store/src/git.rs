//! Thin wrapper over the `git` binary for notes-based receipt storage.
//!
//! Mirrors the shell-out-and-check-status pattern used for the
//! workspace's other git helpers: every call is a single `git` invocation
//! whose stdout is captured and whose non-zero exit becomes a structured
//! error, never a panic.

use std::path::Path;
use tokio::process::Command;

use crate::error::ReceiptStoreError;

/// Git-notes namespace receipts are attached under.
pub const NOTES_REF: &str = "refs/notes/attestations";

async fn run_git(root: &Path, args: &[&str]) -> Result<String, ReceiptStoreError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .await
        .map_err(|e| ReceiptStoreError::GitCommandFailed(format!("spawning git {args:?}: {e}")))?;

    if !output.status.success() {
        return Err(ReceiptStoreError::GitCommandFailed(format!(
            "git {args:?} exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Confirm `root` is inside a git working tree.
pub async fn is_git_repo(root: &Path) -> bool {
    run_git(root, &["rev-parse", "--git-dir"]).await.is_ok()
}

/// Resolve `HEAD` to a commit hash.
pub async fn resolve_head(root: &Path) -> Result<String, ReceiptStoreError> {
    run_git(root, &["rev-parse", "HEAD"]).await
}

/// Read the note body attached to `commit` under [`NOTES_REF`], if any.
pub async fn notes_show(root: &Path, commit: &str) -> Result<Option<String>, ReceiptStoreError> {
    match run_git(root, &["notes", "--ref", NOTES_REF, "show", commit]).await {
        Ok(body) => Ok(Some(body)),
        Err(ReceiptStoreError::GitCommandFailed(_)) => Ok(None),
        Err(other) => Err(other),
    }
}

/// Overwrite (or create) the note attached to `commit` with `body`.
pub async fn notes_add(root: &Path, commit: &str, body: &str) -> Result<(), ReceiptStoreError> {
    run_git(root, &["notes", "--ref", NOTES_REF, "add", "-f", "-m", body, commit])
        .await
        .map(|_| ())
}

/// Remove the note attached to `commit`, if one exists.
pub async fn notes_remove(root: &Path, commit: &str) -> Result<(), ReceiptStoreError> {
    match run_git(root, &["notes", "--ref", NOTES_REF, "remove", commit]).await {
        Ok(_) => Ok(()),
        Err(ReceiptStoreError::GitCommandFailed(_)) => Ok(()),
        Err(other) => Err(other),
    }
}

/// List every commit carrying a note under [`NOTES_REF`], newest first,
/// paired with its committer-date unix timestamp.
pub async fn notes_list(root: &Path) -> Result<Vec<(String, i64)>, ReceiptStoreError> {
    let listing = match run_git(root, &["notes", "--ref", NOTES_REF, "list"]).await {
        Ok(body) => body,
        Err(ReceiptStoreError::GitCommandFailed(_)) => return Ok(Vec::new()),
        Err(other) => return Err(other),
    };
    let mut commits = Vec::new();
    for line in listing.lines() {
        let Some((_note_oid, commit)) = line.split_once(' ') else { continue };
        let ts = commit_timestamp(root, commit).await.unwrap_or(0);
        commits.push((commit.to_string(), ts));
    }
    commits.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(commits)
}

async fn commit_timestamp(root: &Path, commit: &str) -> Result<i64, ReceiptStoreError> {
    let raw = run_git(root, &["show", "-s", "--format=%ct", commit]).await?;
    raw.trim().parse().map_err(|_| ReceiptStoreError::Malformed(format!("bad commit timestamp for {commit}")))
}
