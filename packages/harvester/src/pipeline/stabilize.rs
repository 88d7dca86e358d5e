//! Polling-with-quiescence listing stabilization.

use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::StabilizationConfig;
use crate::error::SourceResult;
use crate::traits::source::ItemSource;

/// Wait for the virtualized listing to stop growing, then snapshot the
/// ordered item ids.
///
/// A single poll is insufficient: the listing grows asynchronously after
/// page load. The shell count must be observed identical across
/// `samples_required` consecutive samples before the snapshot is taken.
/// If the wait bound expires first — or zero shells ever appear — the
/// snapshot falls back to whatever cards are already realized, which may
/// legitimately be none ("zero items on this page" feeds the pagination
/// decision; it is never an error here).
///
/// Cancellation returns an empty snapshot immediately; the runner notices
/// the stop signal on its own.
pub async fn stabilize_listing<S: ItemSource + ?Sized>(
    source: &S,
    config: &StabilizationConfig,
    cancel: &CancellationToken,
) -> SourceResult<Vec<String>> {
    let deadline = Instant::now() + Duration::from_millis(config.max_wait_ms);
    let mut previous: Option<usize> = None;
    let mut stable_samples = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        // a failed sample reads as zero rather than aborting the page
        let count = match source.shell_count().await {
            Ok(count) => count,
            Err(e) => {
                debug!(error = %e, "shell count sample failed");
                0
            }
        };

        stable_samples = if previous == Some(count) {
            stable_samples + 1
        } else {
            1
        };
        previous = Some(count);

        if count > 0 && stable_samples >= config.samples_required {
            debug!(count, samples = stable_samples, "listing quiescent");
            break;
        }

        if Instant::now() >= deadline {
            warn!(
                last_count = count,
                "listing never stabilized; falling back to realized cards"
            );
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(Vec::new()),
            _ = sleep(Duration::from_millis(config.poll_interval_ms)) => {}
        }
    }

    source.discover_item_ids().await
}
