//! Greenhouse DOM selectors and platform defaults.

use crate::{PlatformDefaults, SelectorTable};

pub const LISTING_CONTAINER: &str = "div.job-posts";
pub const LISTING_ITEM: &str = "tr.job-post";
pub const TITLE_LINK: &str = "tr.job-post td.cell a";
pub const LOCATION_CELL: &str = "p.body--metadata";
pub const DATE_POSTED_CELL: &str = "p.body--posted";
pub const PAGINATION_CONTAINER: &str = "div.pagination-wrapper";
pub const NEXT_BUTTON: &str = "button.pagination__next";
pub const JOB_DESCRIPTION: &str = "div.job__description";
pub const JOB_ID_DISPLAY: &str = "p.job-id";

/// Platform defaults contributed to the config merge. Greenhouse boards
/// tolerate the general concurrency default.
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
        job_detail_concurrency: None,
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
