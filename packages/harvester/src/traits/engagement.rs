//! Engagement simulation: the randomized-timing primitive.

use async_trait::async_trait;
use tracing::debug;

/// An opaque suspension that consumes a randomized time budget, imitating
/// reading and scrolling.
///
/// The pipeline treats this purely as a scheduling call: it is invoked
/// once per page and between item-level operations, always after the
/// checkpoint for the preceding work has been persisted, and the runner
/// races it against the stop signal so it never blocks cancellation.
#[async_trait]
pub trait Engagement: Send + Sync {
    /// Suspend for somewhere between `min_ms` and `max_ms` milliseconds.
    ///
    /// `label` names the pipeline position for logging.
    async fn dwell(&self, min_ms: u64, max_ms: u64, label: &str);
}

/// Engagement implementation with uniform random jitter.
#[derive(Debug, Default, Clone)]
pub struct JitterEngagement;

impl JitterEngagement {
    /// Create a jittered engagement simulator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Engagement for JitterEngagement {
    async fn dwell(&self, min_ms: u64, max_ms: u64, label: &str) {
        if max_ms == 0 {
            return;
        }
        let budget = if min_ms >= max_ms {
            max_ms
        } else {
            fastrand::u64(min_ms..=max_ms)
        };
        debug!(label, budget_ms = budget, "engagement dwell");
        tokio::time::sleep(std::time::Duration::from_millis(budget)).await;
    }
}

/// Engagement implementation that returns immediately (tests, dry runs).
#[derive(Debug, Default, Clone)]
pub struct NoopEngagement;

impl NoopEngagement {
    /// Create a no-op engagement simulator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Engagement for NoopEngagement {
    async fn dwell(&self, _min_ms: u64, _max_ms: u64, _label: &str) {}
}
