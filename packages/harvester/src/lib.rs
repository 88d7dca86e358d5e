//! Crash-Safe Resumable Listing Collection
//!
//! A collection pipeline for paginated, virtualized result listings whose
//! execution context is destroyed and recreated on every page transition.
//! The pipeline behaves as one logically continuous run anyway: every
//! stateful decision is re-derivable from a single persisted checkpoint,
//! so an unannounced process kill and a normal page navigation are the
//! same event.
//!
//! # Design Philosophy
//!
//! **"Assume the program dies after every page"**
//!
//! - One checkpoint value, threaded explicitly through the state machine
//! - Persistence is an explicit side effect at defined points
//! - Stage derivation is a pure function of the checkpoint
//! - The AI layer fails open: over-inclusion beats silent data loss
//! - Library handles the pipeline, collaborators handle the page
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvester::{Harvester, StartOptions, MemoryStore, EvalSettings};
//! use harvester::{SessionMode, PageTarget, OutputFormat, OpenAiTransport};
//!
//! let harvester = Harvester::new(source, MemoryStore::new(), transport, engagement, exporter);
//!
//! // Explicit start on a supported listing page
//! let options = StartOptions::new(SessionMode::Jobs)
//!     .with_target(PageTarget::Pages(5))
//!     .with_formats([OutputFormat::Csv])
//!     .with_eval(EvalSettings::two_tier("senior Rust roles, remote"));
//! let outcome = harvester.start(options, current_url, 1).await?;
//!
//! // On every subsequent page load (the context was just recreated):
//! let outcome = harvester.resume().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for every external collaborator (source, store,
//!   evaluator transport, engagement, exporter)
//! - [`types`] - Session, checkpoint, cursor, records, triage
//! - [`pipeline`] - Stage derivation, stabilization, pagination, runner
//! - [`evaluator`] - Two-tier/basic AI protocol with fail-open degradation
//! - [`stores`] - Checkpoint store implementations
//! - [`testing`] - Mock collaborators for testing embedders

pub mod config;
pub mod error;
pub mod evaluator;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{DwellRange, HarvestConfig, StabilizationConfig};
pub use error::{EvalError, ExportError, HarvestError, Result, SourceError, StoreError};
pub use traits::{
    engagement::{Engagement, JitterEngagement, NoopEngagement},
    evaluator::{EvaluatorTransport, ReviewReply, ScreenReply, TriageReply},
    exporter::Exporter,
    source::ItemSource,
    store::CheckpointStore,
};
pub use types::{
    checkpoint::Checkpoint,
    conversation::Conversation,
    cursor::ItemCursor,
    record::{CardRecord, CollectedRecord, JobRecord, OutputFormat, ProfileRecord},
    session::{strip_page_params, EvalMode, EvalSettings, PageTarget, Session, SessionMode},
    triage::{EvalCounters, ReviewDecision, TriageDecision, TriageRecord},
};

// Re-export the pipeline entry points
pub use pipeline::{BootOutcome, FinalReport, Harvester, Stage, StartOptions};

// Re-export the evaluator layer
pub use evaluator::{Evaluator, OpenAiTransport};

// Re-export stores
pub use stores::{JsonFileStore, MemoryStore};
