//! Record types: lightweight cards, full records, and export formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::session::SessionMode;

/// Lightweight per-item summary extracted from the listing card.
///
/// Cheap to produce (no navigation required) and the only thing the triage
/// tier ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Stable identifier of the item on this listing
    pub item_id: String,

    /// Person name or job title
    pub title: String,

    /// Headline or company line, when the card shows one
    pub subtitle: Option<String>,

    /// Free-text snippet from the card body
    pub snippet: Option<String>,

    /// URL of the item's detail page, when the card links one
    pub detail_url: Option<String>,

    /// Whether the listing marks this item as already viewed (jobs)
    pub seen: bool,
}

impl CardRecord {
    /// Create a card with the minimal fields.
    pub fn new(item_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            subtitle: None,
            snippet: None,
            detail_url: None,
            seen: false,
        }
    }

    /// Set the subtitle line.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Set the detail page URL.
    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = Some(url.into());
        self
    }

    /// Mark the card as already viewed.
    pub fn mark_seen(mut self) -> Self {
        self.seen = true;
        self
    }

    /// Render the card as a text block for the evaluator.
    pub fn render(&self) -> String {
        let mut out = format!("Title: {}", self.title);
        if let Some(subtitle) = &self.subtitle {
            out.push_str(&format!("\nSubtitle: {}", subtitle));
        }
        if let Some(snippet) = &self.snippet {
            out.push_str(&format!("\nSnippet: {}", snippet));
        }
        out
    }
}

/// Fully extracted people profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Stable identifier of the item on the listing
    pub item_id: String,

    /// Person name
    pub name: String,

    /// Headline line
    pub headline: Option<String>,

    /// Location line
    pub location: Option<String>,

    /// Canonical profile URL
    pub profile_url: Option<String>,

    /// About/summary section
    pub about: Option<String>,

    /// When the record was extracted
    pub collected_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Create a profile record with the minimal fields.
    pub fn new(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            headline: None,
            location: None,
            profile_url: None,
            about: None,
            collected_at: Utc::now(),
        }
    }

    /// Set the headline.
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the profile URL.
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }

    /// Set the about section.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }
}

/// Fully extracted job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Stable identifier of the item on the listing
    pub item_id: String,

    /// Job title
    pub title: String,

    /// Hiring company
    pub company: Option<String>,

    /// Location line
    pub location: Option<String>,

    /// Canonical posting URL
    pub job_url: Option<String>,

    /// Posting body
    pub description: Option<String>,

    /// Relative or absolute posted-date text as shown on the listing
    pub posted: Option<String>,

    /// When the record was extracted
    pub collected_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a job record with the minimal fields.
    pub fn new(item_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            company: None,
            location: None,
            job_url: None,
            description: None,
            posted: None,
            collected_at: Utc::now(),
        }
    }

    /// Set the company.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the posting URL.
    pub fn with_job_url(mut self, url: impl Into<String>) -> Self {
        self.job_url = Some(url.into());
        self
    }

    /// Set the description body.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the posted-date text.
    pub fn with_posted(mut self, posted: impl Into<String>) -> Self {
        self.posted = Some(posted.into());
        self
    }
}

/// A fully extracted record of either flavor.
///
/// The single tagged union the whole pipeline dispatches on; people and
/// job handling never reference each other directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CollectedRecord {
    /// A people profile
    Profile(ProfileRecord),
    /// A job posting
    Job(JobRecord),
}

impl CollectedRecord {
    /// The item id this record was extracted from.
    pub fn item_id(&self) -> &str {
        match self {
            Self::Profile(p) => &p.item_id,
            Self::Job(j) => &j.item_id,
        }
    }

    /// Which session mode produces this record flavor.
    pub fn mode(&self) -> SessionMode {
        match self {
            Self::Profile(_) => SessionMode::People,
            Self::Job(_) => SessionMode::Jobs,
        }
    }

    /// The record's detail page URL, when known.
    pub fn detail_url(&self) -> Option<&str> {
        match self {
            Self::Profile(p) => p.profile_url.as_deref(),
            Self::Job(j) => j.job_url.as_deref(),
        }
    }

    /// Render the full record as a text block for the review tier.
    pub fn render(&self) -> String {
        match self {
            Self::Profile(p) => {
                let mut out = format!("Name: {}", p.name);
                if let Some(headline) = &p.headline {
                    out.push_str(&format!("\nHeadline: {}", headline));
                }
                if let Some(location) = &p.location {
                    out.push_str(&format!("\nLocation: {}", location));
                }
                if let Some(about) = &p.about {
                    out.push_str(&format!("\nAbout: {}", about));
                }
                out
            }
            Self::Job(j) => {
                let mut out = format!("Title: {}", j.title);
                if let Some(company) = &j.company {
                    out.push_str(&format!("\nCompany: {}", company));
                }
                if let Some(location) = &j.location {
                    out.push_str(&format!("\nLocation: {}", location));
                }
                if let Some(posted) = &j.posted {
                    out.push_str(&format!("\nPosted: {}", posted));
                }
                if let Some(description) = &j.description {
                    out.push_str(&format!("\nDescription: {}", description));
                }
                out
            }
        }
    }
}

/// Output formats the exporter can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values
    Csv,
    /// Spreadsheet workbook
    Spreadsheet,
    /// Markdown table/document
    Markdown,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}
