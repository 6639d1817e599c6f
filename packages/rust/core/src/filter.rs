//! Record filtering: duplicate detail URLs and stale postings.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use rolescout_shared::JobRecord;

/// Boards cap relative dates at `posted 30+ days ago`; such postings are
/// too old to keep.
static STALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"posted\s*30\+\s*days?\s*ago").expect("stale regex"));

/// Whether a raw posted-date string marks the posting as stale.
pub fn is_stale(date_posted_raw: &str) -> bool {
    STALE_RE.is_match(&date_posted_raw.to_lowercase())
}

/// Outcome of one filter pass.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Surviving records, in input order.
    pub records: Vec<JobRecord>,
    pub duplicates_dropped: usize,
    pub stale_dropped: usize,
}

/// Drop stale postings and repeated detail URLs (first occurrence wins),
/// preserving input order. Applying the filter twice is a no-op.
pub fn filter_records(records: Vec<JobRecord>) -> FilterOutcome {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut duplicates_dropped = 0;
    let mut stale_dropped = 0;

    for record in records {
        if is_stale(&record.date_posted_raw) {
            debug!(url = %record.detail_url, raw = %record.date_posted_raw, "dropping stale posting");
            stale_dropped += 1;
            continue;
        }
        if !seen.insert(record.detail_url.clone()) {
            debug!(url = %record.detail_url, "dropping duplicate detail URL");
            duplicates_dropped += 1;
            continue;
        }
        kept.push(record);
    }

    FilterOutcome {
        records: kept,
        duplicates_dropped,
        stale_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolescout_shared::{JobDetail, JobSummary};

    fn record(url: &str, date_posted_raw: &str) -> JobRecord {
        JobRecord::merge(
            "Acme Capital",
            JobSummary {
                title: "Analyst".into(),
                detail_url: url.into(),
                location_raw: String::new(),
                date_posted_raw: date_posted_raw.into(),
                location_parsed: String::new(),
                date_posted_parsed: None,
            },
            JobDetail::unavailable(url),
        )
    }

    #[test]
    fn stale_token_matching() {
        assert!(is_stale("Posted 30+ Days Ago"));
        assert!(is_stale("posted 30+ days ago"));
        assert!(is_stale("POSTED  30+  DAYS  AGO"));
        assert!(is_stale("posted 30+day ago"));
        assert!(!is_stale("Posted 30 Days Ago"));
        assert!(!is_stale("Posted 3 Days Ago"));
        assert!(!is_stale(""));
    }

    #[test]
    fn stale_records_are_dropped() {
        let outcome = filter_records(vec![
            record("https://x.example/1", "Posted 2 days ago"),
            record("https://x.example/2", "Posted 30+ days ago"),
        ]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].detail_url, "https://x.example/1");
        assert_eq!(outcome.stale_dropped, 1);
        assert_eq!(outcome.duplicates_dropped, 0);
    }

    #[test]
    fn first_occurrence_of_a_detail_url_wins() {
        let mut first = record("https://x.example/1", "");
        first.description = "from page one".into();
        let mut dup = record("https://x.example/1", "");
        dup.description = "from page two".into();

        let outcome = filter_records(vec![first, dup, record("https://x.example/2", "")]);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].description, "from page one");
        assert_eq!(outcome.records[1].detail_url, "https://x.example/2");
        assert_eq!(outcome.duplicates_dropped, 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let input = vec![
            record("https://x.example/1", "Posted 2 days ago"),
            record("https://x.example/1", "Posted 2 days ago"),
            record("https://x.example/2", "Posted 30+ days ago"),
            record("https://x.example/3", ""),
        ];
        let once = filter_records(input);
        let twice = filter_records(once.records.clone());
        assert_eq!(once.records, twice.records);
        assert_eq!(twice.duplicates_dropped, 0);
        assert_eq!(twice.stale_dropped, 0);
    }
}
