//! Raw-string normalization shared by the platform parsers: relative and
//! absolute posted-date grammar, location cleanup, and job-id prefixes.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

/// Matches an optional `posted` / `posted on` prefix.
static POSTED_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^posted(\s+on)?\s+").expect("posted prefix regex"));

/// Matches `posted N days ago`.
static DAYS_AGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"posted\s+(\d+)\s+days?\s+ago").expect("days-ago regex"));

/// Matches `posted N+ days ago` (the capped form boards use past 30 days).
static DAYS_PLUS_AGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"posted\s*(\d+)\+\s*days?\s*ago").expect("days-plus regex"));

/// Matches a leading `locations` label with optional colon.
static LOCATIONS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^locations\s*:?\s*").expect("locations prefix regex"));

/// Matches a leading `job id:` label.
static JOB_ID_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^job\s*id\s*:\s*").expect("job id prefix regex"));

/// Matches a leading `REQ` / `REQ-` requisition prefix.
static REQ_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^req-?").expect("req prefix regex"));

/// Absolute-date formats tried in order by the fallback parser.
const ABSOLUTE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y/%m/%d",
];

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Posted-date grammar over a `today` captured once at run start, so a
/// fan-out that crosses midnight stays internally consistent.
#[derive(Debug, Clone, Copy)]
pub struct RelativeDates {
    today: NaiveDate,
}

impl RelativeDates {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// The run-captured reference date.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Parse a raw posted-date string.
    ///
    /// Accepts, case-insensitively: `today` / `just posted`, `yesterday`
    /// (each with an optional `posted` / `posted on` prefix),
    /// `posted N days ago`, `posted N+ days ago`, then a best-effort
    /// absolute-date fallback. Anything else warns and yields `None`.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let cleaned = trimmed.to_lowercase();
        let token = POSTED_PREFIX_RE.replace(&cleaned, "");
        let token = token.trim();

        if token == "today" || token == "just posted" {
            return Some(self.today);
        }
        if token == "yesterday" {
            return self.today.pred_opt();
        }

        if let Some(caps) = DAYS_PLUS_AGO_RE.captures(&cleaned) {
            return self.days_back(&caps[1], raw);
        }
        if let Some(caps) = DAYS_AGO_RE.captures(&cleaned) {
            return self.days_back(&caps[1], raw);
        }

        for format in ABSOLUTE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Some(date);
            }
        }

        warn!(raw, "unrecognized posted-date string");
        None
    }

    fn days_back(&self, digits: &str, raw: &str) -> Option<NaiveDate> {
        let days: i64 = match digits.parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(raw, "posted-date day count out of range");
                return None;
            }
        };
        self.today
            .checked_sub_signed(chrono::Duration::days(days))
            .or_else(|| {
                warn!(raw, days, "posted-date arithmetic underflowed");
                None
            })
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// Strip leading `locations` labels and trim.
///
/// Strips to a fixpoint, so the cleanup is idempotent by construction.
/// Empty input yields an empty string.
pub fn clean_location(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let stripped = LOCATIONS_PREFIX_RE.replace(&current, "");
        let stripped = stripped.trim();
        if stripped == current {
            return current;
        }
        current = stripped.to_string();
    }
}

// ---------------------------------------------------------------------------
// Job ids
// ---------------------------------------------------------------------------

/// Strip a leading `job id:` label and a leading `REQ`/`REQ-` prefix.
/// Never fails; unrecognized input is returned trimmed.
pub fn clean_job_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_label = JOB_ID_PREFIX_RE.replace(trimmed, "");
    let without_req = REQ_PREFIX_RE.replace(without_label.trim(), "");
    without_req.trim().to_string()
}
