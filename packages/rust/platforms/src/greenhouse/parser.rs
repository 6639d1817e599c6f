//! Greenhouse string normalization.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::Parser;
use crate::normalize::{RelativeDates, clean_job_id, clean_location};

/// Greenhouse prefixes location cells with an `Office:` label on some boards.
static OFFICE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^office\s*:?\s*").expect("office prefix regex"));

/// Normalizes Greenhouse's raw strings.
pub struct GreenhouseParser {
    dates: RelativeDates,
}

impl GreenhouseParser {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            dates: RelativeDates::new(today),
        }
    }
}

/// Constructor slot for the registry binding.
pub fn boxed(today: NaiveDate) -> Box<dyn Parser> {
    Box::new(GreenhouseParser::new(today))
}

impl Parser for GreenhouseParser {
    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        self.dates.parse(raw)
    }

    fn parse_location(&self, raw: &str) -> String {
        // Strip both label styles to a fixpoint so the cleanup stays
        // idempotent.
        let mut current = clean_location(raw);
        loop {
            let stripped = OFFICE_PREFIX_RE.replace(&current, "");
            let stripped = clean_location(stripped.trim());
            if stripped == current {
                return current;
            }
            current = stripped;
        }
    }

    fn parse_job_id(&self, raw: &str) -> String {
        clean_job_id(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> GreenhouseParser {
        GreenhouseParser::new(NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"))
    }

    #[test]
    fn office_label_is_stripped() {
        let p = parser();
        assert_eq!(p.parse_location("Office: Amsterdam"), "Amsterdam");
        assert_eq!(p.parse_location("Locations: Office: Dublin"), "Dublin");
        assert_eq!(p.parse_location("Remote - EMEA"), "Remote - EMEA");
    }

    #[test]
    fn location_cleanup_is_idempotent() {
        let p = parser();
        for raw in ["Office: Amsterdam", "Locations: Office: Dublin", "Berlin"] {
            let once = p.parse_location(raw);
            assert_eq!(p.parse_location(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn greenhouse_date_strings() {
        let p = parser();
        assert_eq!(
            p.parse_date("Posted 14 days ago"),
            NaiveDate::from_ymd_opt(2026, 7, 18)
        );
        assert_eq!(p.parse_date("Just Posted"), NaiveDate::from_ymd_opt(2026, 8, 1));
    }
}
