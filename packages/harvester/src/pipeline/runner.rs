//! The session state machine driver.
//!
//! One `Harvester` drives one boot of the pipeline: load the checkpoint,
//! derive the stage, work until the boot resolves to a navigation request
//! or a final report. Navigation destroys the execution context — the
//! embedding application constructs a fresh `Harvester` on the next page
//! load and calls [`resume`](Harvester::resume). There is no dedicated
//! resume logic beyond that: every stateful decision re-derives from the
//! checkpoint, so continuing after a crash and continuing after a dwell
//! are the same code path.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DwellRange, HarvestConfig};
use crate::error::{HarvestError, Result};
use crate::evaluator::Evaluator;
use crate::pipeline::outcome::{BootOutcome, FinalReport};
use crate::pipeline::pagination::should_turn_page;
use crate::pipeline::stabilize::stabilize_listing;
use crate::pipeline::stage::Stage;
use crate::traits::engagement::Engagement;
use crate::traits::evaluator::EvaluatorTransport;
use crate::traits::exporter::Exporter;
use crate::traits::source::ItemSource;
use crate::traits::store::CheckpointStore;
use crate::types::checkpoint::Checkpoint;
use crate::types::conversation::Conversation;
use crate::types::cursor::ItemCursor;
use crate::types::record::{CardRecord, CollectedRecord, OutputFormat};
use crate::types::session::{strip_page_params, EvalMode, EvalSettings, PageTarget, Session, SessionMode};
use crate::types::triage::{ReviewDecision, TriageDecision, TriageRecord};

/// Parameters of an explicit start action.
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// What to collect
    pub mode: SessionMode,

    /// How many pages to cover
    pub target: PageTarget,

    /// Output formats for the final export
    pub formats: Vec<OutputFormat>,

    /// AI filtering settings
    pub eval: EvalSettings,

    /// Jobs mode: also collect postings marked already seen
    pub include_already_seen: bool,
}

impl StartOptions {
    /// Start options with no AI filtering and an unbounded page target.
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            target: PageTarget::Unbounded,
            formats: Vec::new(),
            eval: EvalSettings::disabled(),
            include_already_seen: false,
        }
    }

    /// Set the page target.
    pub fn with_target(mut self, target: PageTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the export formats.
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    /// Set the AI filtering settings.
    pub fn with_eval(mut self, eval: EvalSettings) -> Self {
        self.eval = eval;
        self
    }

    /// Include already-seen postings (jobs mode).
    pub fn with_already_seen(mut self) -> Self {
        self.include_already_seen = true;
        self
    }
}

/// The resumable collection pipeline.
///
/// Generic over every external collaborator; see the crate docs for the
/// seams. All methods take `&self` — the stop signal can be sent from
/// another task holding a clone of the [`cancel_token`](Self::cancel_token).
pub struct Harvester<S, C, T, E, X> {
    source: S,
    store: C,
    evaluator: Evaluator<T>,
    engagement: E,
    exporter: X,
    config: HarvestConfig,
    cancel: CancellationToken,
}

impl<S, C, T, E, X> Harvester<S, C, T, E, X>
where
    S: ItemSource,
    C: CheckpointStore,
    T: EvaluatorTransport,
    E: Engagement,
    X: Exporter,
{
    /// Create a pipeline with the default configuration.
    pub fn new(source: S, store: C, transport: T, engagement: E, exporter: X) -> Self {
        let config = HarvestConfig::default();
        let mut evaluator = Evaluator::new(transport);
        evaluator.set_timeouts(
            std::time::Duration::from_millis(config.triage_timeout_ms),
            std::time::Duration::from_millis(config.review_timeout_ms),
        );
        Self {
            source,
            store,
            evaluator,
            engagement,
            exporter,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.evaluator.set_timeouts(
            std::time::Duration::from_millis(config.triage_timeout_ms),
            std::time::Duration::from_millis(config.review_timeout_ms),
        );
        self.config = config;
        self
    }

    /// A clone of the stop signal.
    ///
    /// Cancelling it unwinds the pipeline to finalization at the next
    /// suspension point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Begin a new collection session on the listing currently showing.
    ///
    /// Rejected — before any state is created — if a session is already
    /// active, or the current page is not a listing of the requested
    /// mode. `listing_url` is the address of the current page;
    /// `page_number` its position in the listing's own pagination.
    pub async fn start(
        &self,
        options: StartOptions,
        listing_url: &str,
        page_number: u32,
    ) -> Result<BootOutcome> {
        if let Some(existing) = self.store.load().await? {
            if existing.session.active {
                return Err(HarvestError::SessionActive);
            }
        }

        let kind = self
            .source
            .listing_kind()
            .await
            .ok_or(HarvestError::UnsupportedPage)?;
        if kind != options.mode {
            return Err(HarvestError::UnsupportedPage);
        }

        let mut session = Session::new(options.mode, strip_page_params(listing_url), page_number)
            .with_target(options.target)
            .with_formats(options.formats)
            .with_eval(options.eval);
        if options.include_already_seen {
            session = session.with_already_seen();
        }

        info!(
            mode = %session.mode,
            page = page_number,
            pages = ?session.target,
            "collection session started"
        );

        let checkpoint = Checkpoint::new(session);
        self.persist(&checkpoint).await?;
        self.run(checkpoint).await
    }

    /// Continue whatever the checkpoint says is in flight.
    ///
    /// Called on every execution-context boot. With no active session
    /// this is a cheap no-op (`Idle`). A session that expected a
    /// different page kind is ended early: collected records are flushed
    /// — partial results are better than none — and the checkpoint is
    /// cleared.
    pub async fn resume(&self) -> Result<BootOutcome> {
        let Some(checkpoint) = self.store.load().await? else {
            return Ok(BootOutcome::Idle);
        };

        if !checkpoint.session.active {
            return self.finalize(checkpoint).await;
        }

        match self.source.listing_kind().await {
            Some(kind) if kind == checkpoint.session.mode => {}
            _ => return self.abort(checkpoint, "resumed on an incompatible page").await,
        }

        debug!(
            stage = ?Stage::derive(Some(&checkpoint)),
            page = checkpoint.session.current_page,
            collected = checkpoint.buffer.len(),
            "resuming from checkpoint"
        );
        self.run(checkpoint).await
    }

    /// Request a stop.
    ///
    /// Flips the persisted active flag and fires the cancellation token;
    /// a running boot unwinds to finalization at its next suspension
    /// point, and a future boot finalizes immediately.
    pub async fn stop(&self) -> Result<()> {
        if let Some(mut checkpoint) = self.store.load().await? {
            if checkpoint.session.active {
                checkpoint.session.active = false;
                self.persist(&checkpoint).await?;
            }
        }
        self.cancel.cancel();
        info!("stop requested");
        Ok(())
    }

    /// The per-boot loop: derive a stage, act, repeat until the boot
    /// resolves.
    async fn run(&self, mut checkpoint: Checkpoint) -> Result<BootOutcome> {
        // Conversation continuity never crosses a page boundary: the log
        // lives only in this boot and starts empty.
        let mut conversation = Conversation::new();
        let mut page_paced = false;

        loop {
            if self.cancel.is_cancelled() && checkpoint.session.active {
                info!("stop observed; unwinding to finalization");
                checkpoint.session.active = false;
                self.persist(&checkpoint).await?;
            }

            match Stage::derive(Some(&checkpoint)) {
                Stage::Idle => return Ok(BootOutcome::Idle),

                Stage::PageLoading => {
                    if !page_paced {
                        self.pace(self.config.page_dwell, "page-settle").await;
                        page_paced = true;
                    }
                    let ids =
                        stabilize_listing(&self.source, &self.config.stabilization, &self.cancel)
                            .await?;
                    info!(
                        page = checkpoint.session.current_page,
                        items = ids.len(),
                        "listing snapshot captured"
                    );
                    checkpoint.cursor = Some(ItemCursor::snapshot(ids));
                    self.persist(&checkpoint).await?;
                }

                Stage::ItemIterating => {
                    self.step_item(&mut checkpoint, &mut conversation).await?;
                    self.pace(self.config.item_dwell, "between-items").await;
                }

                Stage::AwaitingPageTransition => {
                    let has_next = match self.source.has_next_page().await {
                        Ok(has_next) => has_next,
                        Err(e) => {
                            warn!(error = %e, "next-page probe failed; treating as last page");
                            false
                        }
                    };

                    if should_turn_page(&checkpoint.session, has_next) {
                        checkpoint.advance_page();
                        self.persist(&checkpoint).await?;
                        let url = checkpoint.session.page_url(checkpoint.session.current_page);
                        info!(
                            page = checkpoint.session.current_page,
                            url = %url,
                            "requesting navigation"
                        );
                        return Ok(BootOutcome::Navigate { url });
                    }
                    return self.finalize(checkpoint).await;
                }

                Stage::Finalizing => return self.finalize(checkpoint).await,
            }
        }
    }

    /// Process exactly one item, then commit its effects and the cursor
    /// advance in a single save.
    ///
    /// The one save is what makes crash-resume exact: a checkpoint never
    /// holds an appended record with an un-advanced cursor or vice versa,
    /// so resumption always points at the next unprocessed item. The
    /// dwell comes after the save — persist, advance, then suspend.
    async fn step_item(
        &self,
        checkpoint: &mut Checkpoint,
        conversation: &mut Conversation,
    ) -> Result<()> {
        let Some(item_id) = checkpoint
            .cursor
            .as_ref()
            .and_then(|c| c.current())
            .map(str::to_string)
        else {
            return Ok(());
        };

        debug!(
            item = %item_id,
            page = checkpoint.session.current_page,
            "processing item"
        );

        match self.collect_item(&item_id, checkpoint, conversation).await {
            Ok(()) => {}
            // failures local to one item never escalate past it
            Err(HarvestError::Source(e)) => {
                warn!(item = %item_id, error = %e, "item skipped");
                checkpoint.record_triage(TriageRecord::new(
                    item_id.as_str(),
                    TriageDecision::Reject,
                    format!("extraction failed: {}", e),
                ));
            }
            Err(e) => return Err(e),
        }

        if let Some(cursor) = checkpoint.cursor.as_mut() {
            cursor.advance();
        }
        self.persist(checkpoint).await?;
        Ok(())
    }

    /// Run one item through the evaluation protocol and apply its effects
    /// to the checkpoint.
    ///
    /// Decisions and counters are persisted as soon as they are rendered
    /// (a crash must not lose the statistics that explain a zero-match
    /// run); the buffer append itself is left for the caller's atomic
    /// advance-and-save.
    async fn collect_item(
        &self,
        item_id: &str,
        checkpoint: &mut Checkpoint,
        conversation: &mut Conversation,
    ) -> Result<()> {
        let card = self.source.card_summary(item_id).await?;
        let mode = checkpoint.session.mode;

        // jobs only: skip already-seen postings before spending any
        // evaluator budget on them
        if mode == SessionMode::Jobs && !checkpoint.session.include_already_seen && card.seen {
            debug!(item = %item_id, "skipping previously seen posting");
            checkpoint.record_triage(TriageRecord::new(
                item_id,
                TriageDecision::Reject,
                "previously seen",
            ));
            return Ok(());
        }

        let criteria = checkpoint.session.eval.criteria.clone();

        match checkpoint.session.eval.mode {
            EvalMode::Disabled => {
                if let Some(record) = self.fetch_full(item_id, &card, checkpoint).await? {
                    checkpoint.append(record);
                }
            }

            EvalMode::Basic => {
                let reply = self
                    .evaluator
                    .screen(&card.render(), &criteria, conversation)
                    .await;
                checkpoint.counters_mut(mode).record_evaluated();
                let decision = if reply.download {
                    TriageDecision::Keep
                } else {
                    TriageDecision::Reject
                };
                checkpoint.record_triage(TriageRecord::new(item_id, decision, reply.reason));
                self.persist(checkpoint).await?;

                if decision == TriageDecision::Keep {
                    if let Some(record) = self.fetch_full(item_id, &card, checkpoint).await? {
                        checkpoint.append(record);
                        checkpoint.counters_mut(mode).record_accepted();
                    }
                }
            }

            EvalMode::TwoTier => {
                let reply = self
                    .evaluator
                    .triage(&card.render(), &criteria, conversation)
                    .await;
                checkpoint.counters_mut(mode).record_evaluated();
                checkpoint.record_triage(TriageRecord::new(item_id, reply.decision, reply.reason));
                self.persist(checkpoint).await?;

                match reply.decision {
                    // a reject short-circuits before any detail retrieval
                    TriageDecision::Reject => {}

                    TriageDecision::Keep => {
                        if let Some(record) = self.fetch_full(item_id, &card, checkpoint).await? {
                            checkpoint.append(record);
                            checkpoint.counters_mut(mode).record_accepted();
                        }
                    }

                    TriageDecision::Maybe => {
                        let Some(record) = self.fetch_full(item_id, &card, checkpoint).await?
                        else {
                            return Ok(());
                        };
                        let review = self
                            .evaluator
                            .review(&record.render(), &criteria, conversation)
                            .await;
                        checkpoint.counters_mut(mode).record_evaluated();
                        if review.decision == ReviewDecision::Accept {
                            checkpoint.append(record);
                            checkpoint.counters_mut(mode).record_accepted();
                        } else {
                            debug!(item = %item_id, "rejected after full review");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetch an item's full record, recording the deep-dive destination
    /// first so a crash during the visit resumes knowing about it.
    ///
    /// Extraction failures are logged and read as "skip this item".
    async fn fetch_full(
        &self,
        item_id: &str,
        card: &CardRecord,
        checkpoint: &mut Checkpoint,
    ) -> Result<Option<CollectedRecord>> {
        if let Some(url) = &card.detail_url {
            checkpoint.last_detail_url = Some(url.clone());
            self.persist(checkpoint).await?;
        }

        match self.source.full_record(item_id).await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                debug!(item = %item_id, "full record unextractable; skipping");
                Ok(None)
            }
            Err(e) => {
                warn!(item = %item_id, error = %e, "full record extraction failed; skipping");
                Ok(None)
            }
        }
    }

    /// End the run: flush the buffer, report, clear the checkpoint.
    async fn finalize(&self, checkpoint: Checkpoint) -> Result<BootOutcome> {
        let pages_scanned = checkpoint.session.pages_completed();
        let counters = *checkpoint.active_counters();

        let report = if !checkpoint.buffer.is_empty() {
            // fire-and-forget: export failure does not block clearing
            if let Err(e) = self
                .exporter
                .export(&checkpoint.buffer, &checkpoint.session.formats)
                .await
            {
                warn!(error = %e, "export failed");
            }
            FinalReport::Completed {
                records: checkpoint.buffer.len(),
                pages_scanned,
                evaluated: counters.evaluated,
                accepted: counters.accepted,
            }
        } else if counters.any_evaluated() {
            // not a plain empty result: the AI saw items and kept none
            FinalReport::ZeroMatches {
                evaluated: counters.evaluated,
                pages_scanned,
            }
        } else {
            FinalReport::NoItems { pages_scanned }
        };

        self.store.clear().await?;
        info!(report = ?report, "collection session finished");
        Ok(BootOutcome::Finished(report))
    }

    /// End the run early, preserving whatever was collected.
    async fn abort(&self, checkpoint: Checkpoint, reason: &str) -> Result<BootOutcome> {
        warn!(reason, collected = checkpoint.buffer.len(), "ending session early");

        let records_flushed = checkpoint.buffer.len();
        if records_flushed > 0 {
            if let Err(e) = self
                .exporter
                .export(&checkpoint.buffer, &checkpoint.session.formats)
                .await
            {
                warn!(error = %e, "flush export failed");
            }
        }

        self.store.clear().await?;
        Ok(BootOutcome::Finished(FinalReport::Aborted {
            reason: reason.to_string(),
            records_flushed,
        }))
    }

    /// Cancellable engagement dwell.
    async fn pace(&self, range: DwellRange, label: &str) {
        if range.is_zero() || self.cancel.is_cancelled() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.engagement.dwell(range.min_ms, range.max_ms, label) => {}
        }
    }

    async fn persist(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.store.save(checkpoint).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StabilizationConfig;
    use crate::stores::MemoryStore;
    use crate::testing::{
        FailureMode, MockPage, MockSource, MockTransport, MockTransportCall, RecordingExporter,
    };
    use crate::traits::engagement::NoopEngagement;
    use crate::types::record::ProfileRecord;

    type TestHarvester =
        Harvester<MockSource, MemoryStore, MockTransport, NoopEngagement, RecordingExporter>;

    fn fast_config() -> HarvestConfig {
        HarvestConfig::new().without_dwell().with_stabilization(
            StabilizationConfig::new()
                .with_samples_required(2)
                .with_poll_interval_ms(1)
                .with_max_wait_ms(50),
        )
    }

    fn build(
        source: &MockSource,
        store: &MemoryStore,
        transport: &MockTransport,
        exporter: &RecordingExporter,
    ) -> TestHarvester {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Harvester::new(
            source.clone(),
            store.clone(),
            transport.clone(),
            NoopEngagement::new(),
            exporter.clone(),
        )
        .with_config(fast_config())
    }

    /// Follow navigation requests until the run finishes, simulating the
    /// page loads the embedding application would perform.
    async fn drive(
        harvester: &TestHarvester,
        source: &MockSource,
        mut outcome: BootOutcome,
    ) -> FinalReport {
        loop {
            match outcome {
                BootOutcome::Finished(report) => return report,
                BootOutcome::Navigate { .. } => {
                    source.next_page();
                    outcome = harvester.resume().await.unwrap();
                }
                BootOutcome::Idle => panic!("pipeline went idle mid-run"),
            }
        }
    }

    fn people_page(names: &[(&str, &str)]) -> MockPage {
        let mut page = MockPage::new(SessionMode::People);
        for (id, name) in names {
            page = page.with_card(CardRecord::new(*id, *name));
        }
        page
    }

    fn exported_ids(exporter: &RecordingExporter) -> Vec<String> {
        exporter
            .last_records()
            .iter()
            .map(|r| r.item_id().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_single_page_run_without_eval() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada"), ("b", "Bob")]));
        let store = MemoryStore::new();
        let transport = MockTransport::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter);

        let options =
            StartOptions::new(SessionMode::People).with_formats([OutputFormat::Csv]);
        let outcome = harvester
            .start(options, "https://example.com/s?q=x&page=1", 1)
            .await
            .unwrap();

        let report = drive(&harvester, &source, outcome).await;
        assert_eq!(
            report,
            FinalReport::Completed {
                records: 2,
                pages_scanned: 1,
                evaluated: 0,
                accepted: 0,
            }
        );
        assert_eq!(exported_ids(&exporter), vec!["a", "b"]);
        assert_eq!(exporter.last_formats(), vec![OutputFormat::Csv]);
        // no AI layer, no evaluator calls
        assert!(transport.calls().is_empty());
        // checkpoint cleared on finish
        assert!(!store.has_checkpoint());
    }

    #[tokio::test]
    async fn test_start_rejected_while_active() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada")]));
        let store = MemoryStore::new();
        let cp = Checkpoint::new(Session::new(
            SessionMode::People,
            "https://example.com/s",
            1,
        ));
        store.save(&cp).await.unwrap();

        let harvester = build(
            &source,
            &store,
            &MockTransport::new(),
            &RecordingExporter::new(),
        );
        let err = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/s",
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::SessionActive));
    }

    #[tokio::test]
    async fn test_start_rejected_off_listing() {
        // no pages scripted: the current page is not a listing at all
        let source = MockSource::new();
        let store = MemoryStore::new();
        let harvester = build(
            &source,
            &store,
            &MockTransport::new(),
            &RecordingExporter::new(),
        );

        let err = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/feed",
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::UnsupportedPage));
        // rejected before any state was created
        assert!(!store.has_checkpoint());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_start_rejected_on_mode_mismatch() {
        let source =
            MockSource::new().with_page(MockPage::new(SessionMode::Jobs).with_card(
                CardRecord::new("j1", "Engineer"),
            ));
        let store = MemoryStore::new();
        let harvester = build(
            &source,
            &store,
            &MockTransport::new(),
            &RecordingExporter::new(),
        );

        let err = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/jobs",
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::UnsupportedPage));
        assert!(!store.has_checkpoint());
    }

    #[tokio::test]
    async fn test_two_tier_protocol_and_reject_short_circuit() {
        let source = MockSource::new().with_page(people_page(&[
            ("a", "Ada"),
            ("b", "Bob"),
            ("c", "Cyd"),
            ("d", "Dan"),
        ]));
        let store = MemoryStore::new();
        let transport = MockTransport::new()
            .with_triage("Ada", TriageDecision::Keep, "clear match")
            .with_triage("Bob", TriageDecision::Reject, "unrelated")
            .with_triage("Cyd", TriageDecision::Maybe, "thin card")
            .with_triage("Dan", TriageDecision::Maybe, "thin card")
            .with_review("Cyd", ReviewDecision::Accept, "full record matches")
            .with_review("Dan", ReviewDecision::Reject, "full record does not match");
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter);

        let options = StartOptions::new(SessionMode::People)
            .with_eval(EvalSettings::two_tier("analytical engine researchers"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        // kept + maybe-accepted land in the buffer, in listing order
        assert_eq!(exported_ids(&exporter), vec!["a", "c"]);

        // a rejected item is never fetched in full
        let fetched = source.full_record_calls();
        assert_eq!(fetched, vec!["a", "c", "d"]);
        assert!(!fetched.contains(&"b".to_string()));

        // 4 triage calls + 2 review calls; 2 inclusions
        assert_eq!(
            report,
            FinalReport::Completed {
                records: 2,
                pages_scanned: 1,
                evaluated: 6,
                accepted: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_basic_mode_screening() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada"), ("b", "Bob")]));
        let store = MemoryStore::new();
        let transport = MockTransport::new()
            .with_screen("Ada", true, "worth collecting")
            .with_screen("Bob", false, "not relevant");
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter);

        let options = StartOptions::new(SessionMode::People)
            .with_eval(EvalSettings::basic("mathematicians"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["a"]);
        assert_eq!(source.full_record_calls(), vec!["a"]);
        assert_eq!(
            report,
            FinalReport::Completed {
                records: 1,
                pages_scanned: 1,
                evaluated: 2,
                accepted: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_fail_open_never_drops_items() {
        for mode in [
            FailureMode::Error,
            FailureMode::Malformed,
            FailureMode::UnknownDecision,
        ] {
            let source =
                MockSource::new().with_page(people_page(&[("a", "Ada"), ("b", "Bob")]));
            let store = MemoryStore::new();
            let transport = MockTransport::failing(mode);
            let exporter = RecordingExporter::new();
            let harvester = build(&source, &store, &transport, &exporter);

            let options = StartOptions::new(SessionMode::People)
                .with_eval(EvalSettings::two_tier("anything"));
            let outcome = harvester
                .start(options, "https://example.com/s", 1)
                .await
                .unwrap();
            let report = drive(&harvester, &source, outcome).await;

            // every failure resolves to the inclusive outcome
            assert_eq!(exported_ids(&exporter), vec!["a", "b"], "mode {:?}", mode);
            assert!(
                matches!(report, FinalReport::Completed { records: 2, .. }),
                "mode {:?}",
                mode
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_open_on_hung_transport() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada")]));
        let store = MemoryStore::new();
        let transport = MockTransport::failing(FailureMode::Hang);
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter)
            .with_config(fast_config().with_triage_timeout_ms(50).with_review_timeout_ms(50));

        let options =
            StartOptions::new(SessionMode::People).with_eval(EvalSettings::basic("anything"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["a"]);
        assert!(matches!(report, FinalReport::Completed { records: 1, .. }));
    }

    #[tokio::test]
    async fn test_pagination_stops_exactly_at_target() {
        // every page claims a next page exists; the target must win
        let source = MockSource::new()
            .with_page(people_page(&[("a", "Ada")]).with_next_page())
            .with_page(people_page(&[("b", "Bob")]).with_next_page())
            .with_page(people_page(&[("c", "Cyd")]).with_next_page())
            .with_page(people_page(&[("d", "Dan")]).with_next_page());
        let store = MemoryStore::new();
        let transport = MockTransport::new();
        let exporter = RecordingExporter::new();

        let options = StartOptions::new(SessionMode::People).with_target(PageTarget::Pages(3));
        // a fresh pipeline instance per boot, as a real embedder would have
        let first = build(&source, &store, &transport, &exporter)
            .start(options, "https://example.com/s?q=x&page=1", 1)
            .await
            .unwrap();

        let mut outcome = first;
        let mut navigations = 0;
        let report = loop {
            match outcome {
                BootOutcome::Finished(report) => break report,
                BootOutcome::Navigate { url } => {
                    navigations += 1;
                    assert!(url.contains(&format!("page={}", navigations + 1)));
                    source.next_page();
                    let fresh = build(&source, &store, &transport, &exporter);
                    outcome = fresh.resume().await.unwrap();
                }
                BootOutcome::Idle => panic!("pipeline went idle mid-run"),
            }
        };

        assert_eq!(navigations, 2);
        assert_eq!(
            report,
            FinalReport::Completed {
                records: 3,
                pages_scanned: 3,
                evaluated: 0,
                accepted: 0,
            }
        );
        assert_eq!(exported_ids(&exporter), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_run_ends_when_no_next_page() {
        let source = MockSource::new()
            .with_page(people_page(&[("a", "Ada")]).with_next_page())
            .with_page(people_page(&[("b", "Bob")]));
        let store = MemoryStore::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/s",
                1,
            )
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert!(matches!(
            report,
            FinalReport::Completed {
                records: 2,
                pages_scanned: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_match_outcome_is_distinguished() {
        let source = MockSource::new()
            .with_page(people_page(&[("a", "Ada"), ("b", "Bob")]).with_next_page())
            .with_page(people_page(&[("c", "Cyd"), ("d", "Dan")]));
        let store = MemoryStore::new();
        let transport = MockTransport::rejecting();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter);

        let options = StartOptions::new(SessionMode::People)
            .with_eval(EvalSettings::two_tier("nobody matches this"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        // not a plain "no items found": the evaluation history explains it
        assert_eq!(
            report,
            FinalReport::ZeroMatches {
                evaluated: 4,
                pages_scanned: 2,
            }
        );
        assert_eq!(exporter.export_count(), 0);
        assert!(source.full_record_calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_listing_reports_no_items() {
        let source =
            MockSource::new().with_page(MockPage::new(SessionMode::People).with_shell_samples([0]));
        let store = MemoryStore::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/s",
                1,
            )
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert_eq!(report, FinalReport::NoItems { pages_scanned: 1 });
        assert_eq!(exporter.export_count(), 0);
    }

    #[tokio::test]
    async fn test_conversation_resets_at_page_boundary() {
        let source = MockSource::new()
            .with_page(people_page(&[("a", "Ada"), ("b", "Bob")]).with_next_page())
            .with_page(people_page(&[("c", "Cyd"), ("d", "Dan")]));
        let store = MemoryStore::new();
        let transport = MockTransport::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &transport, &exporter);

        let options = StartOptions::new(SessionMode::People)
            .with_eval(EvalSettings::two_tier("everyone"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        drive(&harvester, &source, outcome).await;

        let history: Vec<usize> = transport
            .calls()
            .iter()
            .filter(|c| matches!(c, MockTransportCall::Triage { .. }))
            .map(MockTransportCall::history_len)
            .collect();

        // continuity builds within a page and carries nothing across it
        assert_eq!(history, vec![0, 1, 0, 1]);
    }

    #[tokio::test]
    async fn test_crash_resume_processes_exactly_the_remaining_items() {
        let page = people_page(&[("a", "Ada"), ("b", "Bob"), ("c", "Cyd"), ("d", "Dan")]);
        let store = MemoryStore::new();

        // State as persisted mid-page: items a and b fully processed
        // (appended, cursor advanced), the process killed before c.
        let mut crashed = Checkpoint::new(Session::new(
            SessionMode::People,
            "https://example.com/s",
            1,
        ));
        let mut cursor = ItemCursor::snapshot(vec![
            "a".into(),
            "b".into(),
            "c".into(),
            "d".into(),
        ]);
        cursor.advance();
        cursor.advance();
        crashed.cursor = Some(cursor);
        crashed.append(CollectedRecord::Profile(ProfileRecord::new("a", "Ada")));
        crashed.append(CollectedRecord::Profile(ProfileRecord::new("b", "Bob")));
        store.save(&crashed).await.unwrap();

        // A fresh boot over the same store and listing
        let source = MockSource::new().with_page(page);
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);
        let report = drive(&harvester, &source, harvester.resume().await.unwrap()).await;

        // exactly the remaining items were fetched: none re-done, none skipped
        assert_eq!(source.full_record_calls(), vec!["c", "d"]);
        assert_eq!(exported_ids(&exporter), vec!["a", "b", "c", "d"]);
        assert!(matches!(report, FinalReport::Completed { records: 4, .. }));
    }

    #[tokio::test]
    async fn test_resume_with_no_session_is_idle() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada")]));
        let harvester = build(
            &source,
            &MemoryStore::new(),
            &MockTransport::new(),
            &RecordingExporter::new(),
        );
        assert_eq!(harvester.resume().await.unwrap(), BootOutcome::Idle);
    }

    #[tokio::test]
    async fn test_resume_on_wrong_page_flushes_partials() {
        let store = MemoryStore::new();
        let mut cp = Checkpoint::new(Session::new(
            SessionMode::People,
            "https://example.com/s",
            1,
        ));
        cp.append(CollectedRecord::Profile(ProfileRecord::new("a", "Ada")));
        store.save(&cp).await.unwrap();

        // the context restarted on a jobs listing instead
        let source = MockSource::new()
            .with_page(MockPage::new(SessionMode::Jobs).with_card(CardRecord::new("j1", "Engineer")));
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let outcome = harvester.resume().await.unwrap();
        assert_eq!(
            outcome,
            BootOutcome::Finished(FinalReport::Aborted {
                reason: "resumed on an incompatible page".to_string(),
                records_flushed: 1,
            })
        );
        // partial results are better than none
        assert_eq!(exported_ids(&exporter), vec!["a"]);
        assert!(!store.has_checkpoint());
    }

    #[tokio::test]
    async fn test_stop_flushes_collected_records() {
        let store = MemoryStore::new();
        let mut cp = Checkpoint::new(Session::new(
            SessionMode::People,
            "https://example.com/s",
            1,
        ));
        cp.cursor = Some(ItemCursor::snapshot(vec!["a".into(), "b".into()]));
        cp.append(CollectedRecord::Profile(ProfileRecord::new("a", "Ada")));
        store.save(&cp).await.unwrap();

        let source = MockSource::new().with_page(people_page(&[("a", "Ada"), ("b", "Bob")]));
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        harvester.stop().await.unwrap();
        let outcome = harvester.resume().await.unwrap();

        assert!(matches!(
            outcome,
            BootOutcome::Finished(FinalReport::Completed { records: 1, .. })
        ));
        assert_eq!(exported_ids(&exporter), vec!["a"]);
        // item b was never touched after the stop
        assert!(source.full_record_calls().is_empty());
    }

    #[tokio::test]
    async fn test_export_failure_still_clears_state() {
        let source = MockSource::new().with_page(people_page(&[("a", "Ada")]));
        let store = MemoryStore::new();
        let exporter = RecordingExporter::new().failing();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/s",
                1,
            )
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert!(matches!(report, FinalReport::Completed { records: 1, .. }));
        assert!(!store.has_checkpoint());
    }

    #[tokio::test]
    async fn test_broken_card_skips_only_that_item() {
        let source = MockSource::new().with_page(
            people_page(&[("a", "Ada"), ("b", "Bob")]).with_broken_card("a"),
        );
        let store = MemoryStore::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::People),
                "https://example.com/s",
                1,
            )
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["b"]);
        assert!(matches!(report, FinalReport::Completed { records: 1, .. }));
    }

    #[tokio::test]
    async fn test_unextractable_record_skips_without_accept() {
        let source = MockSource::new().with_page(
            people_page(&[("a", "Ada"), ("b", "Bob")]).with_unextractable("a"),
        );
        let store = MemoryStore::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &store, &MockTransport::new(), &exporter);

        let options =
            StartOptions::new(SessionMode::People).with_eval(EvalSettings::two_tier("everyone"));
        let outcome = harvester
            .start(options, "https://example.com/s", 1)
            .await
            .unwrap();
        let report = drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["b"]);
        assert_eq!(
            report,
            FinalReport::Completed {
                records: 1,
                pages_scanned: 1,
                evaluated: 2,
                accepted: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_seen_postings_skip_before_evaluation() {
        let jobs_page = || {
            MockPage::new(SessionMode::Jobs)
                .with_card(CardRecord::new("j1", "Old posting").mark_seen())
                .with_card(CardRecord::new("j2", "New posting"))
        };

        // default: seen postings are skipped without any evaluator call
        let source = MockSource::new().with_page(jobs_page());
        let transport = MockTransport::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &MemoryStore::new(), &transport, &exporter);
        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::Jobs).with_eval(EvalSettings::two_tier("roles")),
                "https://example.com/jobs",
                1,
            )
            .await
            .unwrap();
        drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["j2"]);
        assert_eq!(transport.calls().len(), 1);

        // with the flag, seen postings go through the normal protocol
        let source = MockSource::new().with_page(jobs_page());
        let transport = MockTransport::new();
        let exporter = RecordingExporter::new();
        let harvester = build(&source, &MemoryStore::new(), &transport, &exporter);
        let outcome = harvester
            .start(
                StartOptions::new(SessionMode::Jobs)
                    .with_eval(EvalSettings::two_tier("roles"))
                    .with_already_seen(),
                "https://example.com/jobs",
                1,
            )
            .await
            .unwrap();
        drive(&harvester, &source, outcome).await;

        assert_eq!(exported_ids(&exporter), vec!["j1", "j2"]);
        assert_eq!(transport.calls().len(), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// 0 = reject, 1 = keep, 2 = maybe then accept, 3 = maybe then reject.
        fn expected_ids(script: &[u8]) -> Vec<String> {
            script
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d == 1 || d == 2)
                .map(|(i, _)| format!("item{}", i))
                .collect()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// The buffer only ever grows, and every append survives to
            /// the end of the run unchanged, for any decision script.
            #[test]
            fn prop_buffer_is_append_only(script in proptest::collection::vec(0u8..4, 0..6)) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let mut page = MockPage::new(SessionMode::People);
                    let mut transport = MockTransport::new();
                    for (i, decision) in script.iter().enumerate() {
                        let id = format!("item{}", i);
                        page = page.with_card(CardRecord::new(id.clone(), id.clone()));
                        transport = match *decision {
                            0 => transport.with_triage(id.as_str(), TriageDecision::Reject, "scripted"),
                            1 => transport.with_triage(id.as_str(), TriageDecision::Keep, "scripted"),
                            2 => transport
                                .with_triage(id.as_str(), TriageDecision::Maybe, "scripted")
                                .with_review(id.as_str(), ReviewDecision::Accept, "scripted"),
                            _ => transport
                                .with_triage(id.as_str(), TriageDecision::Maybe, "scripted")
                                .with_review(id.as_str(), ReviewDecision::Reject, "scripted"),
                        };
                    }

                    let source = MockSource::new().with_page(page);
                    let store = MemoryStore::new();
                    let exporter = RecordingExporter::new();
                    let harvester = build(&source, &store, &transport, &exporter);

                    let options = StartOptions::new(SessionMode::People)
                        .with_eval(EvalSettings::two_tier("scripted"));
                    let outcome = harvester
                        .start(options, "https://example.com/s", 1)
                        .await
                        .unwrap();
                    drive(&harvester, &source, outcome).await;

                    // non-decreasing across every persisted state
                    let history = store.buffer_len_history();
                    for window in history.windows(2) {
                        assert!(window[0] <= window[1], "buffer shrank: {:?}", history);
                    }

                    // every element once appended is present and in order
                    let expected = expected_ids(&script);
                    if expected.is_empty() {
                        assert_eq!(exporter.export_count(), 0);
                    } else {
                        assert_eq!(exported_ids(&exporter), expected);
                    }
                });
            }
        }
    }
}
