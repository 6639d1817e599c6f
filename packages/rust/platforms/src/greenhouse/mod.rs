//! Greenhouse-hosted job boards (`job-boards.greenhouse.io`).
//!
//! Greenhouse boards render one long table of postings grouped by
//! department and load further rows on scroll rather than paginating.

pub mod config;
pub mod crawler;
pub mod parser;

pub use crawler::GreenhouseCrawler;
pub use parser::GreenhouseParser;

use crate::registry::PlatformBinding;

/// Join the platform registry.
pub fn binding() -> PlatformBinding {
    PlatformBinding {
        identifier: "greenhouse",
        defaults: config::defaults,
        make_crawler: crawler::boxed,
        make_parser: parser::boxed,
    }
}
