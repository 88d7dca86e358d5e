//! Triage decisions, per-item records, and evaluation counters.

use serde::{Deserialize, Serialize};

/// Outcome of the cheap, summary-only triage pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageDecision {
    /// Clearly not a match; the full record is never fetched
    Reject,
    /// Clearly a match; fetched in full and collected without review
    Keep,
    /// Uncertain; fetched in full and re-evaluated with the complete content
    Maybe,
}

impl std::fmt::Display for TriageDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Keep => write!(f, "keep"),
            Self::Maybe => write!(f, "maybe"),
        }
    }
}

/// Outcome of the full-record review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    /// Collect the record
    Accept,
    /// Drop the record after seeing the full content
    Reject,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// One item's triage outcome on the current page.
///
/// Accumulated as items are processed; by the time the page's pass is
/// complete there is one record per item. Cleared only when the page
/// advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRecord {
    /// Which item was triaged
    pub item_id: String,

    /// The decision rendered
    pub decision: TriageDecision,

    /// Free-text reasoning (or a pipeline-supplied reason for non-AI skips)
    pub reason: String,
}

impl TriageRecord {
    /// Create a triage record.
    pub fn new(
        item_id: impl Into<String>,
        decision: TriageDecision,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            decision,
            reason: reason.into(),
        }
    }
}

/// Monotonically increasing AI evaluation statistics.
///
/// Persisted with every change so the "no results matched" outcome can be
/// explained even after a crash and resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCounters {
    /// Number of evaluator calls made (triage, review, and screen alike)
    pub evaluated: u64,

    /// Number of items the AI layer let through into the buffer
    pub accepted: u64,
}

impl EvalCounters {
    /// Record one evaluator call.
    pub fn record_evaluated(&mut self) {
        self.evaluated += 1;
    }

    /// Record one AI-approved inclusion.
    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    /// Whether any evaluation has happened.
    pub fn any_evaluated(&self) -> bool {
        self.evaluated > 0
    }
}
