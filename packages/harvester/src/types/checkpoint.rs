//! The checkpoint: everything the pipeline needs to resume after a
//! full execution-context restart.

use serde::{Deserialize, Serialize};

use crate::types::cursor::ItemCursor;
use crate::types::record::CollectedRecord;
use crate::types::session::{Session, SessionMode};
use crate::types::triage::{EvalCounters, TriageRecord};

/// The single serialized value the pipeline persists.
///
/// Every page transition destroys the in-memory program; a boot must be
/// able to re-derive its next step from this value alone. Anything not in
/// here does not survive, by design — the per-page evaluator conversation
/// is the one deliberate omission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The session being run
    pub session: Session,

    /// Iteration state for the current page; None until the listing has
    /// been stabilized and snapshotted
    pub cursor: Option<ItemCursor>,

    /// Append-only buffer of accepted records.
    ///
    /// The sole place permanent evidence of work accumulates; persisted
    /// after every append and never rewritten.
    pub buffer: Vec<CollectedRecord>,

    /// Triage outcomes for items on the current page
    pub triage: Vec<TriageRecord>,

    /// AI statistics for people sessions
    pub people_counters: EvalCounters,

    /// AI statistics for job sessions
    pub jobs_counters: EvalCounters,

    /// URL of the last detail page visited mid-item, recorded before the
    /// fetch so a crash during the visit resumes knowing about it
    pub last_detail_url: Option<String>,
}

impl Checkpoint {
    /// Create a fresh checkpoint for a newly started session.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            cursor: None,
            buffer: Vec::new(),
            triage: Vec::new(),
            people_counters: EvalCounters::default(),
            jobs_counters: EvalCounters::default(),
            last_detail_url: None,
        }
    }

    /// Counters for the given mode.
    pub fn counters(&self, mode: SessionMode) -> &EvalCounters {
        match mode {
            SessionMode::People => &self.people_counters,
            SessionMode::Jobs => &self.jobs_counters,
        }
    }

    /// Mutable counters for the given mode.
    pub fn counters_mut(&mut self, mode: SessionMode) -> &mut EvalCounters {
        match mode {
            SessionMode::People => &mut self.people_counters,
            SessionMode::Jobs => &mut self.jobs_counters,
        }
    }

    /// Counters for the session's own mode.
    pub fn active_counters(&self) -> &EvalCounters {
        self.counters(self.session.mode)
    }

    /// Append an accepted record to the buffer.
    pub fn append(&mut self, record: CollectedRecord) {
        self.buffer.push(record);
    }

    /// Record an item's triage outcome, replacing any earlier record for
    /// the same item.
    ///
    /// A crash-resume re-runs the in-flight item's decision; the page
    /// still ends up with exactly one record per item.
    pub fn record_triage(&mut self, record: TriageRecord) {
        match self.triage.iter_mut().find(|r| r.item_id == record.item_id) {
            Some(existing) => *existing = record,
            None => self.triage.push(record),
        }
    }

    /// Move the session to the next page, resetting page-scoped state.
    ///
    /// The cursor and triage records belong to the page being left; the
    /// evaluator conversation resets on its own because it never persists.
    pub fn advance_page(&mut self) {
        self.session.current_page += 1;
        self.cursor = None;
        self.triage.clear();
        self.last_detail_url = None;
    }
}
