//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that embed the pipeline
//! without a real listing, evaluator endpoint, or filesystem. All mocks
//! are `Clone` with shared interiors, so a test can keep a handle for
//! assertions after moving a clone into the pipeline — and so two
//! pipeline instances can share one mock across a simulated
//! execution-context restart.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{EvalError, EvalResult, ExportResult, SourceError, SourceResult};
use crate::traits::evaluator::{EvaluatorTransport, ReviewReply, ScreenReply, TriageReply};
use crate::traits::exporter::Exporter;
use crate::traits::source::ItemSource;
use crate::types::conversation::Conversation;
use crate::types::record::{CardRecord, CollectedRecord, JobRecord, OutputFormat, ProfileRecord};
use crate::types::session::SessionMode;
use crate::types::triage::{ReviewDecision, TriageDecision};

// ============================================================================
// MockSource
// ============================================================================

/// One scripted listing page.
#[derive(Debug, Clone)]
pub struct MockPage {
    kind: SessionMode,
    cards: Vec<CardRecord>,
    records: HashMap<String, CollectedRecord>,
    unextractable: HashSet<String>,
    broken_cards: HashSet<String>,
    shell_samples: Vec<usize>,
    has_next: bool,
}

impl MockPage {
    /// Create an empty page of the given listing kind.
    pub fn new(kind: SessionMode) -> Self {
        Self {
            kind,
            cards: Vec::new(),
            records: HashMap::new(),
            unextractable: HashSet::new(),
            broken_cards: HashSet::new(),
            shell_samples: Vec::new(),
            has_next: false,
        }
    }

    /// Add a card. Item order on the page is insertion order.
    pub fn with_card(mut self, card: CardRecord) -> Self {
        self.cards.push(card);
        self
    }

    /// Provide an explicit full record for an item.
    ///
    /// Items without one get a record synthesized from their card.
    pub fn with_record(mut self, record: CollectedRecord) -> Self {
        self.records.insert(record.item_id().to_string(), record);
        self
    }

    /// Make an item's full record unextractable (`Ok(None)`).
    pub fn with_unextractable(mut self, item_id: impl Into<String>) -> Self {
        self.unextractable.insert(item_id.into());
        self
    }

    /// Make an item's card extraction fail.
    pub fn with_broken_card(mut self, item_id: impl Into<String>) -> Self {
        self.broken_cards.insert(item_id.into());
        self
    }

    /// Script the shell-count samples the virtualized listing reports.
    ///
    /// Samples are consumed one per poll; the last one repeats. Without a
    /// script the page reports its card count immediately.
    pub fn with_shell_samples(mut self, samples: impl IntoIterator<Item = usize>) -> Self {
        self.shell_samples = samples.into_iter().collect();
        self
    }

    /// Report that a next page exists.
    pub fn with_next_page(mut self) -> Self {
        self.has_next = true;
        self
    }

    fn synthesize_record(&self, card: &CardRecord) -> CollectedRecord {
        match self.kind {
            SessionMode::People => {
                let mut profile = ProfileRecord::new(card.item_id.clone(), card.title.clone());
                if let Some(subtitle) = &card.subtitle {
                    profile = profile.with_headline(subtitle.clone());
                }
                if let Some(url) = &card.detail_url {
                    profile = profile.with_profile_url(url.clone());
                }
                CollectedRecord::Profile(profile)
            }
            SessionMode::Jobs => {
                let mut job = JobRecord::new(card.item_id.clone(), card.title.clone());
                if let Some(subtitle) = &card.subtitle {
                    job = job.with_company(subtitle.clone());
                }
                if let Some(url) = &card.detail_url {
                    job = job.with_job_url(url.clone());
                }
                CollectedRecord::Job(job)
            }
        }
    }
}

/// Record of a call made to the mock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSourceCall {
    ListingKind,
    ShellCount,
    Discover,
    Card { item_id: String },
    FullRecord { item_id: String },
    HasNext,
}

/// A scripted item source over a sequence of pages.
///
/// The source models the execution context: [`next_page`](Self::next_page)
/// simulates the navigation the pipeline requests, moving the "current
/// page" forward the way a browser load would.
#[derive(Clone, Default)]
pub struct MockSource {
    pages: Arc<RwLock<Vec<MockPage>>>,
    current: Arc<RwLock<usize>>,
    shell_cursor: Arc<RwLock<usize>>,
    calls: Arc<RwLock<Vec<MockSourceCall>>>,
}

impl MockSource {
    /// Create a source with no pages (an unsupported page).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted page.
    pub fn with_page(self, page: MockPage) -> Self {
        self.pages.write().unwrap().push(page);
        self
    }

    /// Simulate a navigation to the next scripted page.
    pub fn next_page(&self) {
        *self.current.write().unwrap() += 1;
        *self.shell_cursor.write().unwrap() = 0;
    }

    /// Index of the page currently showing.
    pub fn current_page(&self) -> usize {
        *self.current.read().unwrap()
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<MockSourceCall> {
        self.calls.read().unwrap().clone()
    }

    /// Item ids for which a full-record fetch was attempted.
    pub fn full_record_calls(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockSourceCall::FullRecord { item_id } => Some(item_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of shell-count samples taken.
    pub fn shell_count_calls(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockSourceCall::ShellCount))
            .count()
    }

    fn record(&self, call: MockSourceCall) {
        self.calls.write().unwrap().push(call);
    }

    fn with_current_page<R>(&self, f: impl FnOnce(&MockPage) -> R) -> Option<R> {
        let pages = self.pages.read().unwrap();
        let current = *self.current.read().unwrap();
        pages.get(current).map(f)
    }
}

#[async_trait]
impl ItemSource for MockSource {
    async fn listing_kind(&self) -> Option<SessionMode> {
        self.record(MockSourceCall::ListingKind);
        self.with_current_page(|p| p.kind)
    }

    async fn shell_count(&self) -> SourceResult<usize> {
        self.record(MockSourceCall::ShellCount);
        let count = self
            .with_current_page(|p| {
                if p.shell_samples.is_empty() {
                    return p.cards.len();
                }
                let cursor = *self.shell_cursor.read().unwrap();
                let sample = p.shell_samples[cursor.min(p.shell_samples.len() - 1)];
                *self.shell_cursor.write().unwrap() = cursor + 1;
                sample
            })
            .unwrap_or(0);
        Ok(count)
    }

    async fn discover_item_ids(&self) -> SourceResult<Vec<String>> {
        self.record(MockSourceCall::Discover);
        Ok(self
            .with_current_page(|p| p.cards.iter().map(|c| c.item_id.clone()).collect())
            .unwrap_or_default())
    }

    async fn card_summary(&self, item_id: &str) -> SourceResult<CardRecord> {
        self.record(MockSourceCall::Card {
            item_id: item_id.to_string(),
        });
        self.with_current_page(|p| {
            if p.broken_cards.contains(item_id) {
                return Err(SourceError::extraction(item_id, "card extraction failed"));
            }
            p.cards
                .iter()
                .find(|c| c.item_id == item_id)
                .cloned()
                .ok_or_else(|| SourceError::extraction(item_id, "no such card"))
        })
        .unwrap_or_else(|| Err(SourceError::extraction(item_id, "no page showing")))
    }

    async fn full_record(&self, item_id: &str) -> SourceResult<Option<CollectedRecord>> {
        self.record(MockSourceCall::FullRecord {
            item_id: item_id.to_string(),
        });
        self.with_current_page(|p| {
            if p.unextractable.contains(item_id) {
                return Ok(None);
            }
            if let Some(record) = p.records.get(item_id) {
                return Ok(Some(record.clone()));
            }
            p.cards
                .iter()
                .find(|c| c.item_id == item_id)
                .map(|card| Some(p.synthesize_record(card)))
                .ok_or_else(|| SourceError::extraction(item_id, "no such item"))
        })
        .unwrap_or_else(|| Err(SourceError::extraction(item_id, "no page showing")))
    }

    async fn has_next_page(&self) -> SourceResult<bool> {
        self.record(MockSourceCall::HasNext);
        Ok(self.with_current_page(|p| p.has_next).unwrap_or(false))
    }
}

// ============================================================================
// MockTransport
// ============================================================================

/// How a failing transport fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Immediate transport error
    Error,
    /// Never completes (exercises the tier timeouts)
    Hang,
    /// Body that does not parse
    Malformed,
    /// Parsed body carrying a decision value nobody recognizes
    UnknownDecision,
}

/// Record of a call made to the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTransportCall {
    Triage { summary: String, history_len: usize },
    Review { detail: String, history_len: usize },
    Screen { summary: String, history_len: usize },
}

impl MockTransportCall {
    /// Conversation length the call was made with.
    pub fn history_len(&self) -> usize {
        match self {
            Self::Triage { history_len, .. }
            | Self::Review { history_len, .. }
            | Self::Screen { history_len, .. } => *history_len,
        }
    }
}

/// A scripted evaluator transport.
///
/// Decisions are scripted by substring match against the rendered item
/// text; unmatched items fall through to the defaults (permissive unless
/// [`rejecting`](Self::rejecting) flips them).
#[derive(Clone)]
pub struct MockTransport {
    triage_rules: Arc<RwLock<Vec<(String, TriageDecision, String)>>>,
    review_rules: Arc<RwLock<Vec<(String, ReviewDecision, String)>>>,
    screen_rules: Arc<RwLock<Vec<(String, bool, String)>>>,
    default_triage: TriageDecision,
    default_review: ReviewDecision,
    default_screen: bool,
    failure: Option<FailureMode>,
    calls: Arc<RwLock<Vec<MockTransportCall>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a transport that keeps/accepts everything by default.
    pub fn new() -> Self {
        Self {
            triage_rules: Arc::new(RwLock::new(Vec::new())),
            review_rules: Arc::new(RwLock::new(Vec::new())),
            screen_rules: Arc::new(RwLock::new(Vec::new())),
            default_triage: TriageDecision::Keep,
            default_review: ReviewDecision::Accept,
            default_screen: true,
            failure: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a transport that rejects everything by default.
    pub fn rejecting() -> Self {
        let mut transport = Self::new();
        transport.default_triage = TriageDecision::Reject;
        transport.default_review = ReviewDecision::Reject;
        transport.default_screen = false;
        transport
    }

    /// Create a transport that fails every call the given way.
    pub fn failing(mode: FailureMode) -> Self {
        let mut transport = Self::new();
        transport.failure = Some(mode);
        transport
    }

    /// Script a triage decision for items whose text contains `needle`.
    pub fn with_triage(
        self,
        needle: impl Into<String>,
        decision: TriageDecision,
        reason: impl Into<String>,
    ) -> Self {
        self.triage_rules
            .write()
            .unwrap()
            .push((needle.into(), decision, reason.into()));
        self
    }

    /// Script a review decision for items whose text contains `needle`.
    pub fn with_review(
        self,
        needle: impl Into<String>,
        decision: ReviewDecision,
        reason: impl Into<String>,
    ) -> Self {
        self.review_rules
            .write()
            .unwrap()
            .push((needle.into(), decision, reason.into()));
        self
    }

    /// Script a screen decision for items whose text contains `needle`.
    pub fn with_screen(
        self,
        needle: impl Into<String>,
        download: bool,
        reason: impl Into<String>,
    ) -> Self {
        self.screen_rules
            .write()
            .unwrap()
            .push((needle.into(), download, reason.into()));
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<MockTransportCall> {
        self.calls.read().unwrap().clone()
    }

    async fn maybe_fail(&self) -> EvalResult<()> {
        match self.failure {
            None => Ok(()),
            Some(FailureMode::Error) => {
                Err(EvalError::Transport("injected transport failure".into()))
            }
            Some(FailureMode::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Err(EvalError::Transport("hang elapsed".into()))
            }
            Some(FailureMode::Malformed) => {
                Err(EvalError::Malformed("injected garbage body".into()))
            }
            Some(FailureMode::UnknownDecision) => Err(EvalError::UnrecognizedDecision {
                raw: "perhaps".into(),
            }),
        }
    }
}

#[async_trait]
impl EvaluatorTransport for MockTransport {
    async fn triage_call(
        &self,
        summary: &str,
        _criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<TriageReply> {
        self.calls.write().unwrap().push(MockTransportCall::Triage {
            summary: summary.to_string(),
            history_len: conversation.len(),
        });
        self.maybe_fail().await?;

        let rules = self.triage_rules.read().unwrap();
        let (decision, reason) = rules
            .iter()
            .find(|(needle, _, _)| summary.contains(needle))
            .map(|(_, d, r)| (*d, r.clone()))
            .unwrap_or((self.default_triage, "default".to_string()));
        Ok(TriageReply { decision, reason })
    }

    async fn review_call(
        &self,
        detail: &str,
        _criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ReviewReply> {
        self.calls.write().unwrap().push(MockTransportCall::Review {
            detail: detail.to_string(),
            history_len: conversation.len(),
        });
        self.maybe_fail().await?;

        let rules = self.review_rules.read().unwrap();
        let (decision, reason) = rules
            .iter()
            .find(|(needle, _, _)| detail.contains(needle))
            .map(|(_, d, r)| (*d, r.clone()))
            .unwrap_or((self.default_review, "default".to_string()));
        Ok(ReviewReply { decision, reason })
    }

    async fn screen_call(
        &self,
        summary: &str,
        _criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ScreenReply> {
        self.calls.write().unwrap().push(MockTransportCall::Screen {
            summary: summary.to_string(),
            history_len: conversation.len(),
        });
        self.maybe_fail().await?;

        let rules = self.screen_rules.read().unwrap();
        let (download, reason) = rules
            .iter()
            .find(|(needle, _, _)| summary.contains(needle))
            .map(|(_, d, r)| (*d, r.clone()))
            .unwrap_or((self.default_screen, "default".to_string()));
        Ok(ScreenReply { download, reason })
    }
}

// ============================================================================
// RecordingExporter
// ============================================================================

/// Exporter that records every export it receives.
#[derive(Clone, Default)]
pub struct RecordingExporter {
    exports: Arc<RwLock<Vec<(Vec<CollectedRecord>, Vec<OutputFormat>)>>>,
    fail: Arc<RwLock<bool>>,
}

impl RecordingExporter {
    /// Create a recording exporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every export fail (the pipeline must still clear its state).
    pub fn failing(self) -> Self {
        *self.fail.write().unwrap() = true;
        self
    }

    /// Number of exports received.
    pub fn export_count(&self) -> usize {
        self.exports.read().unwrap().len()
    }

    /// Records from the most recent export.
    pub fn last_records(&self) -> Vec<CollectedRecord> {
        self.exports
            .read()
            .unwrap()
            .last()
            .map(|(records, _)| records.clone())
            .unwrap_or_default()
    }

    /// Formats from the most recent export.
    pub fn last_formats(&self) -> Vec<OutputFormat> {
        self.exports
            .read()
            .unwrap()
            .last()
            .map(|(_, formats)| formats.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(
        &self,
        records: &[CollectedRecord],
        formats: &[OutputFormat],
    ) -> ExportResult<()> {
        self.exports
            .write()
            .unwrap()
            .push((records.to_vec(), formats.to_vec()));
        if *self.fail.read().unwrap() {
            return Err(crate::error::ExportError::Encode {
                format: "csv".to_string(),
                reason: "injected export failure".to_string(),
            });
        }
        Ok(())
    }
}
