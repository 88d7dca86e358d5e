//! Pure stage derivation from the checkpoint.

use crate::types::checkpoint::Checkpoint;

/// Where in the collection lifecycle a boot finds itself.
///
/// Derived purely from the checkpoint on every boot — there is no separate
/// resume path with different semantics from normal continuation.
/// Resumption IS continuation after an externally imposed interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No active session
    Idle,

    /// Session active, current page not yet snapshotted
    PageLoading,

    /// Items remain at the cursor on the current page
    ItemIterating,

    /// Page exhausted; the pagination decision is next
    AwaitingPageTransition,

    /// Stop requested or run complete; flush and clear
    Finalizing,
}

impl Stage {
    /// Derive the stage from the persisted state alone.
    pub fn derive(checkpoint: Option<&Checkpoint>) -> Self {
        let Some(cp) = checkpoint else {
            return Self::Idle;
        };

        if !cp.session.active {
            return Self::Finalizing;
        }

        match &cp.cursor {
            None => Self::PageLoading,
            Some(cursor) if cursor.is_exhausted() => Self::AwaitingPageTransition,
            Some(_) => Self::ItemIterating,
        }
    }
}
