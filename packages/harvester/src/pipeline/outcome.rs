//! Per-boot outcomes and final run reports.

use serde::{Deserialize, Serialize};

/// What a single boot of the pipeline resolved to.
///
/// The embedding application acts on this: `Navigate` means "load this
/// URL", which destroys the execution context — the next boot picks up
/// from the checkpoint as if the process had been killed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BootOutcome {
    /// No active session; nothing to do
    Idle,

    /// Load the given page URL to continue the run
    Navigate {
        /// URL of the next page
        url: String,
    },

    /// The run ended; the checkpoint has been cleared
    Finished(FinalReport),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinalReport {
    /// Records were collected and handed to the exporter
    Completed {
        /// Number of records exported
        records: usize,
        /// Pages processed
        pages_scanned: u32,
        /// Evaluator calls made
        evaluated: u64,
        /// AI-approved inclusions
        accepted: u64,
    },

    /// AI evaluation ran but let nothing through — distinguished from a
    /// listing that simply had no items, so the user sees why the result
    /// is empty
    ZeroMatches {
        /// Evaluator calls made
        evaluated: u64,
        /// Pages processed
        pages_scanned: u32,
    },

    /// No items were found and no evaluation happened
    NoItems {
        /// Pages processed
        pages_scanned: u32,
    },

    /// The run ended early (wrong page on resume); whatever had been
    /// collected was flushed first
    Aborted {
        /// Why the run ended
        reason: String,
        /// Records flushed to the exporter on the way out
        records_flushed: usize,
    },
}

impl FinalReport {
    /// Whether the run produced any records.
    pub fn has_records(&self) -> bool {
        matches!(
            self,
            Self::Completed { records, .. } if *records > 0
        ) || matches!(
            self,
            Self::Aborted { records_flushed, .. } if *records_flushed > 0
        )
    }
}
