//! Page-scoped iteration state over the snapshotted id list.

use serde::{Deserialize, Serialize};

/// Position tracker over the ids captured for the current page.
///
/// The id list is snapshotted exactly once per page, after the listing has
/// stabilized, and is never recomputed mid-page: the listing is
/// virtualized, so a re-query could return a different ordering and cause
/// items to be skipped or revisited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCursor {
    /// Ordered item ids captured for this page
    pub item_ids: Vec<String>,

    /// Index of the next unprocessed item
    pub index: usize,
}

impl ItemCursor {
    /// Snapshot a stabilized id list, positioned at the first item.
    pub fn snapshot(item_ids: Vec<String>) -> Self {
        Self { item_ids, index: 0 }
    }

    /// The id at the cursor, or None when the page is exhausted.
    pub fn current(&self) -> Option<&str> {
        self.item_ids.get(self.index).map(String::as_str)
    }

    /// Move past the current item.
    pub fn advance(&mut self) {
        if self.index < self.item_ids.len() {
            self.index += 1;
        }
    }

    /// Whether every item on the page has been processed.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.item_ids.len()
    }

    /// Number of items not yet processed.
    pub fn remaining(&self) -> usize {
        self.item_ids.len().saturating_sub(self.index)
    }

    /// Total number of items on the page.
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    /// Whether the page had no items at all.
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}
