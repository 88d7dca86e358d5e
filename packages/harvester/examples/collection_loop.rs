//! Collection Loop - Reference Implementation
//!
//! This example demonstrates the embedding side of the pipeline: the boot
//! loop an application runs around it. It's a **reference implementation**
//! showing how to combine the library's mechanism with your own page
//! plumbing.
//!
//! # Mechanism vs Plumbing
//!
//! The harvester library provides **mechanism** (how a run survives):
//! - `start()` / `resume()` - one boot of the state machine
//! - `BootOutcome::Navigate` - the request to load the next page
//! - the checkpoint store - the only state that survives the load
//!
//! The embedding application adds **plumbing** (where pages come from):
//! - an `ItemSource` over the real listing markup
//! - performing the navigation the pipeline requests
//! - calling `resume()` on every boot, whatever caused it
//!
//! This example wires the mocks in place of real collaborators so it runs
//! without a listing or an evaluator endpoint. Swap them for your own
//! implementations of the same traits.
//!
//! ```bash
//! cargo run --example collection_loop
//! ```

use harvester::testing::{MockPage, MockSource, MockTransport, RecordingExporter};
use harvester::{
    BootOutcome, CardRecord, CheckpointStore, EvalSettings, Harvester, JsonFileStore,
    NoopEngagement, OutputFormat, PageTarget, ReviewDecision, SessionMode, StartOptions,
    TriageDecision,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("harvester=debug")
        .init();

    // Stand-ins for the real collaborators. A browser-backed ItemSource
    // and an OpenAiTransport would slot into the same seams.
    let source = MockSource::new()
        .with_page(
            MockPage::new(SessionMode::People)
                .with_card(CardRecord::new("a", "Ada Lovelace").with_subtitle("Analyst"))
                .with_card(CardRecord::new("b", "Bob Ross").with_subtitle("Painter"))
                .with_next_page(),
        )
        .with_page(
            MockPage::new(SessionMode::People)
                .with_card(CardRecord::new("c", "Charles Babbage").with_subtitle("Engineer")),
        );
    let transport = MockTransport::new()
        .with_triage("Bob", TriageDecision::Reject, "not a computing figure")
        .with_triage("Charles", TriageDecision::Maybe, "could be")
        .with_review("Charles", ReviewDecision::Accept, "difference engine counts");
    let exporter = RecordingExporter::new();

    let store_path = std::env::temp_dir().join("harvester-example.json");
    // leftover state from an interrupted previous run would read as an
    // active session and block the start
    JsonFileStore::new(&store_path).clear().await?;
    let build = || {
        Harvester::new(
            source.clone(),
            JsonFileStore::new(&store_path),
            transport.clone(),
            NoopEngagement::new(),
            exporter.clone(),
        )
    };

    // Explicit start on the first page of the listing.
    let options = StartOptions::new(SessionMode::People)
        .with_target(PageTarget::Pages(2))
        .with_formats([OutputFormat::Csv])
        .with_eval(EvalSettings::two_tier("computing pioneers"));
    let mut outcome = build()
        .start(options, "https://example.com/search?q=pioneers&page=1", 1)
        .await?;

    // The boot loop. In a real embedder each iteration is a genuine page
    // load: the old context is gone and `build()` runs in the new one.
    let report = loop {
        match outcome {
            BootOutcome::Finished(report) => break report,
            BootOutcome::Navigate { url } => {
                println!("navigating to {url}");
                source.next_page();
                outcome = build().resume().await?;
            }
            BootOutcome::Idle => unreachable!("a session is in flight"),
        }
    };

    println!("run finished: {report:?}");
    for record in exporter.last_records() {
        println!("collected: {}", record.item_id());
    }
    Ok(())
}
