//! In-memory checkpoint store for testing and development.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::error::StoreResult;
use crate::traits::store::CheckpointStore;
use crate::types::checkpoint::Checkpoint;

/// In-memory checkpoint storage.
///
/// Useful for testing and development; data is lost on restart. Clones
/// share the same underlying slot, which is how tests hand one store to
/// two pipeline instances across a simulated execution-context restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    checkpoint: Arc<RwLock<Option<Checkpoint>>>,
    saves: Arc<RwLock<u64>>,
    buffer_lens: Arc<RwLock<Vec<usize>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a checkpoint is currently stored.
    pub fn has_checkpoint(&self) -> bool {
        self.checkpoint.read().unwrap().is_some()
    }

    /// Number of saves performed.
    pub fn save_count(&self) -> u64 {
        *self.saves.read().unwrap()
    }

    /// Buffer length observed at each save, in order.
    ///
    /// Lets tests assert the append-only property across a whole run.
    pub fn buffer_len_history(&self) -> Vec<usize> {
        self.buffer_lens.read().unwrap().clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self) -> StoreResult<Option<Checkpoint>> {
        Ok(self.checkpoint.read().unwrap().clone())
    }

    async fn save(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        *self.checkpoint.write().unwrap() = Some(checkpoint.clone());
        *self.saves.write().unwrap() += 1;
        self.buffer_lens.write().unwrap().push(checkpoint.buffer.len());
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.checkpoint.write().unwrap() = None;
        Ok(())
    }
}
