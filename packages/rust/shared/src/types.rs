//! Core domain types for RoleScout job listings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel used for detail fields that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel the enrichment model emits for fields it cannot resolve.
/// Normalized to `None` before a record leaves the enrichment layer.
pub const UNKNOWN_SENTINEL: &str = "Unknown";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one scrape run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// JobSummary
// ---------------------------------------------------------------------------

/// One job card extracted from a listing page.
///
/// `detail_url` is always absolute when produced by a platform crawler;
/// relative hrefs are resolved against the listing base URL at extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Posting title from the card's title link. Never empty.
    pub title: String,
    /// Absolute URL of the job detail page.
    pub detail_url: String,
    /// Raw location cell text, exactly as the board renders it.
    #[serde(default)]
    pub location_raw: String,
    /// Raw posted-date cell text.
    #[serde(default)]
    pub date_posted_raw: String,
    /// Location after the legacy string cleanup (`Locations:` prefix stripped).
    #[serde(default)]
    pub location_parsed: String,
    /// Posted date normalized to a calendar date, if interpretable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_posted_parsed: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// JobDetail
// ---------------------------------------------------------------------------

/// Fields extracted from a single job detail page.
///
/// A detail is emitted for every attempted summary; extraction failures
/// degrade individual fields to [`NOT_AVAILABLE`] instead of going missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    /// The summary's `detail_url`, echoed back.
    pub url: String,
    /// Full posting description text.
    pub description: String,
    /// Requisition/job identifier with vendor prefixes stripped.
    pub job_id: String,
    /// `<title>` of the detail page.
    pub detail_page_title: String,
}

impl JobDetail {
    /// A detail with every extracted field degraded to the sentinel.
    pub fn unavailable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: NOT_AVAILABLE.into(),
            job_id: NOT_AVAILABLE.into(),
            detail_page_title: NOT_AVAILABLE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StructuredLocation
// ---------------------------------------------------------------------------

/// Structured location produced by the enrichment model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Model confidence in `[0, 1]`. Informational only.
    #[serde(default)]
    pub confidence: f64,
}

impl StructuredLocation {
    /// Normalize model output: `"Unknown"` scalars become `None`, empty
    /// strings become `None`, and confidence is clamped into `[0, 1]`.
    pub fn normalized(self) -> Self {
        Self {
            city: scrub(self.city),
            country: scrub(self.country),
            region: scrub(self.region),
            confidence: self.confidence.clamp(0.0, 1.0),
        }
    }
}

fn scrub(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_SENTINEL) {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// The merged summary + detail for one posting, plus enrichment fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Employer name; identical for every record in a run.
    pub company_name: String,
    pub title: String,
    pub detail_url: String,
    #[serde(default)]
    pub location_raw: String,
    #[serde(default)]
    pub location_parsed: String,
    #[serde(default)]
    pub date_posted_raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_posted_parsed: Option<NaiveDate>,
    pub description: String,
    pub job_id: String,
    pub detail_page_title: String,
    /// Structured location from enrichment; absent when the engine is
    /// disabled or the whole fallback chain came up empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_parsed_intelligent: Option<StructuredLocation>,
}

impl JobRecord {
    /// Merge a summary with its detail under the run's company name.
    pub fn merge(company_name: &str, summary: JobSummary, detail: JobDetail) -> Self {
        Self {
            company_name: company_name.to_string(),
            title: summary.title,
            detail_url: summary.detail_url,
            location_raw: summary.location_raw,
            location_parsed: summary.location_parsed,
            date_posted_raw: summary.date_posted_raw,
            date_posted_parsed: summary.date_posted_parsed,
            description: detail.description,
            job_id: detail.job_id,
            detail_page_title: detail.detail_page_title,
            location_parsed_intelligent: None,
        }
    }
}
