//! Workday DOM selectors and platform defaults.

use crate::{PlatformDefaults, SelectorTable};

pub const LISTING_CONTAINER: &str = r#"section[data-automation-id="jobResults"]"#;
pub const LISTING_ITEM: &str = r#"section[data-automation-id="jobResults"] ul > li"#;
pub const TITLE_LINK: &str = r#"a[data-automation-id="jobTitle"]"#;
pub const LOCATION_CELL: &str = r#"div[data-automation-id="locations"] dd"#;
pub const DATE_POSTED_CELL: &str = r#"div[data-automation-id="postedOn"] dd"#;
pub const PAGINATION_CONTAINER: &str = r#"nav[aria-label="pagination"]"#;
pub const NEXT_BUTTON: &str = r#"nav[aria-label="pagination"] button[aria-label="next"]"#;
pub const JOB_DESCRIPTION: &str = r#"div[data-automation-id="jobPostingDescription"]"#;
pub const JOB_ID_DISPLAY: &str = r#"div[data-automation-id="requisitionId"] dd"#;

/// Workday boards throttle aggressively; stay below the general default.
pub const JOB_DETAIL_CONCURRENCY: usize = 8;

/// Platform defaults contributed to the config merge.
pub fn defaults() -> PlatformDefaults {
    PlatformDefaults {
        selectors: SelectorTable {
            listing_container: LISTING_CONTAINER.into(),
            listing_item: LISTING_ITEM.into(),
            title_link: TITLE_LINK.into(),
            location_cell: LOCATION_CELL.into(),
            date_posted_cell: DATE_POSTED_CELL.into(),
            pagination_container: PAGINATION_CONTAINER.into(),
            next_button: NEXT_BUTTON.into(),
            job_description: JOB_DESCRIPTION.into(),
            job_id_display: JOB_ID_DISPLAY.into(),
        },
        job_detail_concurrency: Some(JOB_DETAIL_CONCURRENCY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_table_passes_the_probe() {
        assert!(defaults().selectors.validate().is_ok());
    }
}
