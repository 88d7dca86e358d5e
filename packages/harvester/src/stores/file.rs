//! JSON file checkpoint store with integrity checking.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::CheckpointStore;
use crate::types::checkpoint::Checkpoint;

/// Durable single-file checkpoint storage.
///
/// The file holds a digest line followed by the JSON payload; writes go
/// through a temp file and a rename so an interrupted save never leaves a
/// half-written checkpoint behind. A payload that fails the digest or
/// does not parse is reported as [`StoreError::Corrupted`] — the caller
/// surfaces that to the user rather than guessing.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        tmp.set_extension("tmp");
        tmp
    }

    fn digest(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl CheckpointStore for JsonFileStore {
    async fn load(&self) -> StoreResult<Option<Checkpoint>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let Some((digest, payload)) = contents.split_once('\n') else {
            return Err(StoreError::Corrupted {
                reason: "missing digest line".to_string(),
            });
        };

        if digest != Self::digest(payload) {
            return Err(StoreError::Corrupted {
                reason: "digest mismatch".to_string(),
            });
        }

        let checkpoint = serde_json::from_str(payload).map_err(|e| StoreError::Corrupted {
            reason: format!("unparseable payload: {}", e),
        })?;
        Ok(Some(checkpoint))
    }

    async fn save(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        let payload = serde_json::to_string(checkpoint)?;
        let contents = format!("{}\n{}", Self::digest(&payload), payload);

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
