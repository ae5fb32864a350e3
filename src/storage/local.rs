//! Local filesystem checkpoint store.
//!
//! The checkpoint is written to a sibling temp file, synced, then renamed
//! over the live file. A crash before the rename leaves the previous
//! checkpoint untouched; the stale temp file is simply overwritten by the
//! next commit.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Checkpoint;
use crate::storage::CheckpointStore;

/// Checkpoint store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct LocalCheckpointStore {
    path: PathBuf,
}

impl LocalCheckpointStore {
    /// Create a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the live checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the in-flight temp file.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, sync, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CheckpointStore for LocalCheckpointStore {
    async fn load(&self, collection_id: &str) -> Result<Option<Checkpoint>> {
        let Some(bytes) = self.read_bytes().await? else {
            log::debug!(
                "No checkpoint at {} for list {}",
                self.path.display(),
                collection_id
            );
            return Ok(None);
        };
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;
        log::debug!(
            "Loaded checkpoint for list {} (page {}) from {}",
            checkpoint.collection_id,
            checkpoint.page,
            self.path.display()
        );
        Ok(Some(checkpoint))
    }

    async fn commit(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Checkpoint committed: page={} total={} event={}",
            checkpoint.page,
            checkpoint.total_written,
            checkpoint.last_event
        );
        Ok(())
    }
}
