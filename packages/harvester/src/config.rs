//! Configuration for the collection pipeline.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a collection run.
///
/// Defaults are conservative enough for slow listings; tests tighten them
/// to keep runtimes short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Listing stabilization (quiescence) sampling
    pub stabilization: StabilizationConfig,

    /// Timeout for the cheap, summary-only triage call
    pub triage_timeout_ms: u64,

    /// Timeout for the full-record review call (larger payloads)
    pub review_timeout_ms: u64,

    /// Dwell range applied once per page, before touching the listing
    pub page_dwell: DwellRange,

    /// Dwell range applied between item-level operations
    pub item_dwell: DwellRange,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            stabilization: StabilizationConfig::default(),
            triage_timeout_ms: 15_000,
            review_timeout_ms: 45_000,
            page_dwell: DwellRange::new(2_000, 6_000),
            item_dwell: DwellRange::new(800, 2_500),
        }
    }
}

impl HarvestConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stabilization parameters.
    pub fn with_stabilization(mut self, stabilization: StabilizationConfig) -> Self {
        self.stabilization = stabilization;
        self
    }

    /// Set the triage call timeout.
    pub fn with_triage_timeout_ms(mut self, ms: u64) -> Self {
        self.triage_timeout_ms = ms;
        self
    }

    /// Set the review call timeout.
    pub fn with_review_timeout_ms(mut self, ms: u64) -> Self {
        self.review_timeout_ms = ms;
        self
    }

    /// Set the per-page dwell range.
    pub fn with_page_dwell(mut self, range: DwellRange) -> Self {
        self.page_dwell = range;
        self
    }

    /// Set the between-items dwell range.
    pub fn with_item_dwell(mut self, range: DwellRange) -> Self {
        self.item_dwell = range;
        self
    }

    /// Disable all dwells (for tests and dry runs).
    pub fn without_dwell(mut self) -> Self {
        self.page_dwell = DwellRange::new(0, 0);
        self.item_dwell = DwellRange::new(0, 0);
        self
    }
}

/// Parameters for the polling-with-quiescence listing check.
///
/// The listing is virtualized and grows asynchronously after page load, so
/// a single poll proves nothing. The shell count must be observed identical
/// across `samples_required` consecutive samples before the id snapshot is
/// taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizationConfig {
    /// Consecutive identical samples required to declare quiescence
    pub samples_required: usize,

    /// Delay between samples in milliseconds
    pub poll_interval_ms: u64,

    /// Upper bound on the whole stabilization wait in milliseconds
    pub max_wait_ms: u64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            samples_required: 3,
            poll_interval_ms: 300,
            max_wait_ms: 10_000,
        }
    }
}

impl StabilizationConfig {
    /// Create a stabilization config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required consecutive sample count.
    pub fn with_samples_required(mut self, samples: usize) -> Self {
        self.samples_required = samples;
        self
    }

    /// Set the sample interval.
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the overall wait bound.
    pub fn with_max_wait_ms(mut self, ms: u64) -> Self {
        self.max_wait_ms = ms;
        self
    }
}

/// A randomized delay budget in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DwellRange {
    /// Minimum delay
    pub min_ms: u64,

    /// Maximum delay
    pub max_ms: u64,
}

impl DwellRange {
    /// Create a dwell range.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A zero-length range (no delay).
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Check whether this range ever produces a delay.
    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }
}
