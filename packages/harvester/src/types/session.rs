//! The collection session and its settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::record::OutputFormat;

/// What kind of records a session collects, and equally what kind of
/// listing a page shows.
///
/// People and job sessions share the entire pipeline; dispatch happens on
/// this tag alone, so the two flavors never need to reference each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// People profile listings
    People,
    /// Job posting listings
    Jobs,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::People => write!(f, "people"),
            Self::Jobs => write!(f, "jobs"),
        }
    }
}

/// How many pages a session should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageTarget {
    /// Collect exactly this many pages (counting the starting page)
    Pages(u32),
    /// Keep paginating until the listing reports no next page
    Unbounded,
}

impl PageTarget {
    /// Check whether `pages_completed` satisfies this target.
    pub fn is_reached(&self, pages_completed: u32) -> bool {
        match self {
            Self::Pages(n) => pages_completed >= *n,
            Self::Unbounded => false,
        }
    }
}

/// Which evaluation strategy the session runs.
///
/// Basic and two-tier are two named strategies behind the same evaluator
/// interface; they share wiring, fail-open behavior, and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    /// No AI filtering; every extractable item is collected
    Disabled,
    /// Single binary call per item (`download: true/false`)
    Basic,
    /// Cheap triage first, full review only for uncertain items
    TwoTier,
}

/// AI filtering settings carried by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalSettings {
    /// Strategy selector
    pub mode: EvalMode,

    /// Free-text matching criteria supplied by the user
    pub criteria: String,
}

impl EvalSettings {
    /// No AI filtering.
    pub fn disabled() -> Self {
        Self {
            mode: EvalMode::Disabled,
            criteria: String::new(),
        }
    }

    /// Binary screening against the given criteria.
    pub fn basic(criteria: impl Into<String>) -> Self {
        Self {
            mode: EvalMode::Basic,
            criteria: criteria.into(),
        }
    }

    /// Two-tier triage against the given criteria.
    pub fn two_tier(criteria: impl Into<String>) -> Self {
        Self {
            mode: EvalMode::TwoTier,
            criteria: criteria.into(),
        }
    }

    /// Check whether any AI calls will be made.
    pub fn is_enabled(&self) -> bool {
        self.mode != EvalMode::Disabled
    }
}

/// The unit of a collection run.
///
/// Created by an explicit start, mutated by every pipeline step, destroyed
/// by stop/finish or by resuming on an incompatible page. Everything here
/// is persisted inside the checkpoint; the session must be reconstructible
/// from storage alone after the execution context is destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique id for this run
    pub id: Uuid,

    /// What the session collects
    pub mode: SessionMode,

    /// False once a stop was requested or the run finished.
    ///
    /// Doubles as the mutual-exclusion signal: a second start while this
    /// is true is invalid.
    pub active: bool,

    /// Page number the run started on
    pub start_page: u32,

    /// Page number currently being processed
    pub current_page: u32,

    /// How many pages to cover
    pub target: PageTarget,

    /// Listing URL with page-position parameters stripped, used to
    /// reconstruct the URL of any page number
    pub base_url: String,

    /// Output formats selected for the final export
    pub formats: Vec<OutputFormat>,

    /// Jobs mode only: collect postings the listing marks as already seen
    pub include_already_seen: bool,

    /// AI filtering settings
    pub eval: EvalSettings,

    /// When the session was started
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Create a new active session starting on `start_page`.
    pub fn new(mode: SessionMode, base_url: impl Into<String>, start_page: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            active: true,
            start_page,
            current_page: start_page,
            target: PageTarget::Unbounded,
            base_url: base_url.into(),
            formats: Vec::new(),
            include_already_seen: false,
            eval: EvalSettings::disabled(),
            started_at: Utc::now(),
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

    /// Include items the listing marks as already seen (jobs mode).
    pub fn with_already_seen(mut self) -> Self {
        self.include_already_seen = true;
        self
    }

    /// Number of pages completed so far, counting the current one.
    pub fn pages_completed(&self) -> u32 {
        self.current_page.saturating_sub(self.start_page) + 1
    }

    /// Reconstruct the URL of a specific page number.
    pub fn page_url(&self, page: u32) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(mut parsed) => {
                let kept: Vec<(String, String)> = parsed
                    .query_pairs()
                    .filter(|(k, _)| k != "page")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                {
                    let mut pairs = parsed.query_pairs_mut();
                    pairs.clear();
                    for (k, v) in &kept {
                        pairs.append_pair(k, v);
                    }
                    pairs.append_pair("page", &page.to_string());
                }
                parsed.to_string()
            }
            // Non-parseable base URLs still get a usable page marker
            Err(_) => format!("{}?page={}", self.base_url, page),
        }
    }

    /// URL of the page after the current one.
    pub fn next_page_url(&self) -> String {
        self.page_url(self.current_page + 1)
    }
}

/// Strip page-position and page-size parameters from a listing URL.
///
/// The result is the session's `base_url`, from which any page's URL can
/// be reconstructed with [`Session::page_url`].
pub fn strip_page_params(listing_url: &str) -> String {
    match url::Url::parse(listing_url) {
        Ok(mut parsed) => {
            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k != "page" && k != "count" && k != "pageSize")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            if kept.is_empty() {
                parsed.set_query(None);
            } else {
                let mut pairs = parsed.query_pairs_mut();
                pairs.clear();
                for (k, v) in &kept {
                    pairs.append_pair(k, v);
                }
            }
            parsed.to_string()
        }
        Err(_) => listing_url.to_string(),
    }
}
