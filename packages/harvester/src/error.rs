//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Note that most failure modes
//! in the pipeline deliberately do NOT surface as errors: evaluator
//! failures fail open, per-item extraction failures skip the item, and a
//! wrong-page resume flushes partial results. The variants here cover the
//! few cases that are genuinely fatal or that a collaborator needs to
//! report upward.

use thiserror::Error;

/// Errors that can terminate a pipeline boot.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Checkpoint store failed (corruption is the user-visible case)
    #[error("checkpoint store error: {0}")]
    Store(#[from] StoreError),

    /// Item source failed at page scope (item-scoped failures are skipped)
    #[error("item source error: {0}")]
    Source(#[from] SourceError),

    /// A start was requested while a session is already active
    #[error("a collection session is already active")]
    SessionActive,

    /// A start was requested on a page that is not a supported listing
    #[error("current page is not a supported listing")]
    UnsupportedPage,
}

/// Errors from the checkpoint store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted checkpoint exists but cannot be trusted.
    ///
    /// Surfaced to the caller so the user can clear the store manually.
    #[error("checkpoint corrupted: {reason}")]
    Corrupted { reason: String },

    /// Underlying I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint serialization failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the item source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A single item's card or detail could not be read
    #[error("extraction failed for item {item_id}: {reason}")]
    Extraction { item_id: String, reason: String },

    /// The listing itself could not be queried
    #[error("listing query failed: {0}")]
    Listing(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Convenience constructor for per-item extraction failures.
    pub fn extraction(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            item_id: item_id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the remote evaluator transport.
///
/// These never reach the user: the evaluator resolves every one of them
/// to the permissive outcome (fail-open).
#[derive(Debug, Error)]
pub enum EvalError {
    /// Transport-level failure (network, HTTP status, etc.)
    #[error("evaluator transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The call did not complete within its tier's timeout
    #[error("evaluator call timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// Response body could not be parsed
    #[error("malformed evaluator response: {0}")]
    Malformed(String),

    /// Response parsed but carried a decision value we do not recognize
    #[error("unrecognized decision: {raw}")]
    UnrecognizedDecision { raw: String },

    /// Response carried no content at all
    #[error("empty evaluator response")]
    Empty,

    /// Transport misconfiguration (missing API key, bad base URL)
    #[error("evaluator config error: {0}")]
    Config(String),
}

/// Errors from the exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A specific output format could not be produced
    #[error("failed to encode {format}: {reason}")]
    Encode { format: String, reason: String },

    /// Underlying I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for item source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for evaluator transport operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Result type alias for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
