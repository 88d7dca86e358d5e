//! Checkpoint store trait.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::checkpoint::Checkpoint;

/// The only state that survives an execution-context restart.
///
/// The store holds at most one checkpoint. There is never more than one
/// active pipeline instance per store — the session's `active` flag inside
/// the checkpoint is the mutual-exclusion signal, not a store-level lock.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted checkpoint, if any.
    ///
    /// Corruption surfaces as an error (the user must clear the store);
    /// a cleanly absent checkpoint is `Ok(None)`.
    async fn load(&self) -> StoreResult<Option<Checkpoint>>;

    /// Persist the checkpoint, replacing any previous one atomically.
    async fn save(&self, checkpoint: &Checkpoint) -> StoreResult<()>;

    /// Remove the persisted checkpoint.
    async fn clear(&self) -> StoreResult<()>;
}
