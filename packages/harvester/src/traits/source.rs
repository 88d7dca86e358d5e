//! Item source trait for listing access and per-item extraction.
//!
//! The item source owns all selector-level knowledge of the listing:
//! which page kind is showing, how many placeholder shells the
//! virtualized listing has realized, which item ids are discoverable, and
//! how to extract card summaries and full records. The pipeline never
//! touches markup itself.

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::types::record::{CardRecord, CollectedRecord};
use crate::types::session::SessionMode;

/// Access to the listing currently loaded in the execution context.
///
/// Implementations are page-scoped: after a navigation, the embedding
/// application constructs a fresh source for the new context.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Identify what kind of listing the current page shows.
    ///
    /// Returns `None` when the page is not a supported listing at all —
    /// the signal both for rejecting a start and for detecting that a
    /// resume landed somewhere unexpected.
    async fn listing_kind(&self) -> Option<SessionMode>;

    /// Count the lightweight placeholder shells currently present.
    ///
    /// This is the raw sample for the quiescence check: the listing
    /// grows asynchronously after page load, so the pipeline polls this
    /// count until it is identical across several consecutive samples
    /// before trusting [`discover_item_ids`](Self::discover_item_ids).
    async fn shell_count(&self) -> SourceResult<usize>;

    /// Return the ordered ids of every discoverable item on the page.
    ///
    /// Called once per page, after stabilization. When zero shells ever
    /// appeared this doubles as the fallback: whatever cards are already
    /// realized are what the page has.
    async fn discover_item_ids(&self) -> SourceResult<Vec<String>>;

    /// Extract the lightweight card summary for an item.
    async fn card_summary(&self, item_id: &str) -> SourceResult<CardRecord>;

    /// Extract the full record for an item.
    ///
    /// Expensive: may involve opening the item's detail view. Returns
    /// `Ok(None)` when the item exists but cannot be extracted — the
    /// pipeline skips it and moves on.
    async fn full_record(&self, item_id: &str) -> SourceResult<Option<CollectedRecord>>;

    /// Probe whether the listing offers a next page.
    ///
    /// A listing with no pagination controls at all reports `false`.
    async fn has_next_page(&self) -> SourceResult<bool>;
}
