//! Exporter trait: the output-file sink for the final buffer.

use async_trait::async_trait;

use crate::error::ExportResult;
use crate::types::record::{CollectedRecord, OutputFormat};

/// Consumes the final buffer and produces output files.
///
/// Fire-and-forget from the pipeline's perspective: the core clears its
/// own state once finalization is reached, regardless of export success —
/// an export failure is logged, never re-run.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Write the collected records in each requested format.
    async fn export(
        &self,
        records: &[CollectedRecord],
        formats: &[OutputFormat],
    ) -> ExportResult<()>;
}
