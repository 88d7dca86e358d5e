//! Integration tests for the full collection lifecycle.
//!
//! These tests treat the pipeline the way an embedding application does:
//! every navigation request destroys the "execution context" (the
//! pipeline instance is dropped and rebuilt from nothing), and only the
//! durable checkpoint file carries state across the gap.

use harvester::testing::{MockPage, MockSource, MockTransport, RecordingExporter};
use harvester::{
    BootOutcome, CardRecord, Checkpoint, CheckpointStore, CollectedRecord, EvalSettings,
    FinalReport, HarvestConfig, Harvester, ItemCursor, JsonFileStore, NoopEngagement, OutputFormat,
    PageTarget, ProfileRecord, ReviewDecision, Session, SessionMode, StabilizationConfig,
    StartOptions, TriageDecision,
};
use uuid::Uuid;

type PipelineUnderTest =
    Harvester<MockSource, JsonFileStore, MockTransport, NoopEngagement, RecordingExporter>;

fn temp_store() -> JsonFileStore {
    let path = std::env::temp_dir().join(format!("harvester-itest-{}.json", Uuid::new_v4()));
    JsonFileStore::new(path)
}

fn fast_config() -> HarvestConfig {
    HarvestConfig::new().without_dwell().with_stabilization(
        StabilizationConfig::new()
            .with_samples_required(2)
            .with_poll_interval_ms(1)
            .with_max_wait_ms(50),
    )
}

/// Build a pipeline instance from scratch, as a fresh execution context
/// would.
fn boot(
    source: &MockSource,
    store_path: &std::path::Path,
    transport: &MockTransport,
    exporter: &RecordingExporter,
) -> PipelineUnderTest {
    Harvester::new(
        source.clone(),
        JsonFileStore::new(store_path),
        transport.clone(),
        NoopEngagement::new(),
        exporter.clone(),
    )
    .with_config(fast_config())
}

#[tokio::test]
async fn test_full_lifecycle_across_context_restarts() {
    let source = MockSource::new()
        .with_page(
            MockPage::new(SessionMode::People)
                .with_card(CardRecord::new("a", "Ada"))
                .with_card(CardRecord::new("b", "Bob"))
                .with_next_page(),
        )
        .with_page(
            MockPage::new(SessionMode::People)
                .with_card(CardRecord::new("c", "Cyd"))
                .with_next_page(),
        )
        .with_page(
            MockPage::new(SessionMode::People)
                .with_card(CardRecord::new("d", "Dan"))
                .with_next_page(),
        );
    let transport = MockTransport::new()
        .with_triage("Bob", TriageDecision::Reject, "unrelated")
        .with_triage("Dan", TriageDecision::Maybe, "thin card")
        .with_review("Dan", ReviewDecision::Accept, "matches after all");
    let exporter = RecordingExporter::new();
    let store = temp_store();
    let store_path = store.path().to_path_buf();

    // first context: explicit start
    let options = StartOptions::new(SessionMode::People)
        .with_target(PageTarget::Pages(3))
        .with_formats([OutputFormat::Markdown])
        .with_eval(EvalSettings::two_tier("computing pioneers"));
    let first = boot(&source, &store_path, &transport, &exporter);
    let mut outcome = first
        .start(options, "https://example.com/s?q=pioneers&page=1", 1)
        .await
        .unwrap();
    drop(first);

    // every navigation destroys the context; only the file survives
    let report = loop {
        match outcome {
            BootOutcome::Finished(report) => break report,
            BootOutcome::Navigate { .. } => {
                source.next_page();
                let reborn = boot(&source, &store_path, &transport, &exporter);
                outcome = reborn.resume().await.unwrap();
            }
            BootOutcome::Idle => panic!("pipeline went idle mid-run"),
        }
    };

    assert_eq!(
        report,
        FinalReport::Completed {
            records: 3,
            pages_scanned: 3,
            // 4 triage calls + 1 review call
            evaluated: 5,
            accepted: 3,
        }
    );

    let exported: Vec<String> = exporter
        .last_records()
        .iter()
        .map(|r| r.item_id().to_string())
        .collect();
    assert_eq!(exported, vec!["a", "c", "d"]);
    assert_eq!(exporter.last_formats(), vec![OutputFormat::Markdown]);

    // each collected item was fetched exactly once across all contexts,
    // and the rejected item never at all
    let mut fetched = source.full_record_calls();
    fetched.sort();
    assert_eq!(fetched, vec!["a", "c", "d"]);

    // nothing left behind
    assert!(store.load().await.unwrap().is_none());
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_restart_after_kill_mid_page() {
    let store = temp_store();
    let store_path = store.path().to_path_buf();

    // State exactly as the pipeline persisted it before the kill: second
    // page of the run, three items snapshotted, the first already
    // processed and appended, and one triage call already counted.
    let mut session = Session::new(SessionMode::People, "https://example.com/s", 1)
        .with_eval(EvalSettings::two_tier("computing pioneers"));
    session.current_page = 2;
    let mut checkpoint = Checkpoint::new(session);
    let mut cursor = ItemCursor::snapshot(vec!["a".into(), "b".into(), "c".into()]);
    cursor.advance();
    checkpoint.cursor = Some(cursor);
    checkpoint.append(CollectedRecord::Profile(ProfileRecord::new("a", "Ada")));
    checkpoint.people_counters.record_evaluated();
    checkpoint.people_counters.record_accepted();
    store.save(&checkpoint).await.unwrap();

    let source = MockSource::new().with_page(
        MockPage::new(SessionMode::People)
            .with_card(CardRecord::new("a", "Ada"))
            .with_card(CardRecord::new("b", "Bob"))
            .with_card(CardRecord::new("c", "Cyd")),
    );
    let transport = MockTransport::new();
    let exporter = RecordingExporter::new();

    let reborn = boot(&source, &store_path, &transport, &exporter);
    let outcome = reborn.resume().await.unwrap();

    // the statistics recorded before the kill survived it
    assert_eq!(
        outcome,
        BootOutcome::Finished(FinalReport::Completed {
            records: 3,
            pages_scanned: 2,
            evaluated: 3,
            accepted: 3,
        })
    );

    // only the unprocessed items were touched after the restart
    assert_eq!(source.full_record_calls(), vec!["b", "c"]);

    let exported: Vec<String> = exporter
        .last_records()
        .iter()
        .map(|r| r.item_id().to_string())
        .collect();
    assert_eq!(exported, vec!["a", "b", "c"]);
}
