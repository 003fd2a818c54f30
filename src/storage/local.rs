//! Local filesystem state store.
//!
//! Keeps the state document in a single JSON file. Writes go to a sibling
//! temp file which is then renamed over the target, so a run interrupted
//! mid-write leaves the previous document in place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::HashCodeSet;
use crate::storage::{StateDocument, StateGateway};

/// Local filesystem state backend.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// The temp file is removed again if any step fails.
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let written = Self::replace_with(&tmp, &self.path, bytes).await;
        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove {}: {}", tmp.display(), e);
                }
            }
        }
        written
    }

    async fn replace_with(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(tmp, target).await?;
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

    /// Load the raw state document, if one has been written.
    pub async fn load_document(&self) -> Result<Option<StateDocument>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateGateway for LocalStateStore {
    async fn read_identifiers(&self) -> Result<HashCodeSet> {
        match self.load_document().await {
            Ok(Some(document)) => Ok(document.into_set()),
            Ok(None) => {
                log::info!("No previous state at {}", self.path.display());
                Ok(HashCodeSet::new())
            }
            Err(e) => Err(AppError::state(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_identifiers(&self, hash_codes: &HashCodeSet) -> Result<()> {
        let document = StateDocument::new(hash_codes);
        let bytes = serde_json::to_vec_pretty(&document).map_err(|e| {
            AppError::persist(format!("failed to encode state document: {}", e))
        })?;
        self.write_bytes(&bytes).await.map_err(|e| {
            AppError::persist(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        log::info!(
            "Stored {} hash codes to {}",
            hash_codes.len(),
            self.path.display()
        );
        Ok(())
    }
}
