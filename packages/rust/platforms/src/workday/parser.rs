//! Workday string normalization.

use chrono::NaiveDate;

use crate::Parser;
use crate::normalize::{RelativeDates, clean_job_id, clean_location};

/// Normalizes Workday's raw strings: `Posted N Days Ago` dates,
/// `Locations:`-labelled location cells, and `REQ-` requisition ids.
pub struct WorkdayParser {
    dates: RelativeDates,
}

impl WorkdayParser {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            dates: RelativeDates::new(today),
        }
    }
}

/// Constructor slot for the registry binding.
pub fn boxed(today: NaiveDate) -> Box<dyn Parser> {
    Box::new(WorkdayParser::new(today))
}

impl Parser for WorkdayParser {
    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        self.dates.parse(raw)
    }

    fn parse_location(&self, raw: &str) -> String {
        clean_location(raw)
    }

    fn parse_job_id(&self, raw: &str) -> String {
        clean_job_id(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> WorkdayParser {
        WorkdayParser::new(NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"))
    }

    #[test]
    fn workday_date_strings() {
        let p = parser();
        assert_eq!(
            p.parse_date("Posted Today"),
            NaiveDate::from_ymd_opt(2026, 8, 1)
        );
        assert_eq!(
            p.parse_date("Posted 6 Days Ago"),
            NaiveDate::from_ymd_opt(2026, 7, 26)
        );
        assert_eq!(
            p.parse_date("Posted 30+ Days Ago"),
            NaiveDate::from_ymd_opt(2026, 7, 2)
        );
    }

    #[test]
    fn workday_location_and_id_strings() {
        let p = parser();
        assert_eq!(p.parse_location("Locations: Boston, MA"), "Boston, MA");
        assert_eq!(p.parse_job_id("REQ-2026-0042"), "2026-0042");
    }
}
