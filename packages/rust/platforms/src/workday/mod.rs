//! Workday-hosted career boards (`*.myworkdayjobs.com`).
//!
//! Workday renders listings as a single-page app with numbered pagination
//! and `data-automation-id` attributes on every element of interest.

pub mod config;
pub mod crawler;
pub mod parser;

pub use crawler::WorkdayCrawler;
pub use parser::WorkdayParser;

use crate::registry::PlatformBinding;

/// Join the platform registry.
pub fn binding() -> PlatformBinding {
    PlatformBinding {
        identifier: "workday",
        defaults: config::defaults,
        make_crawler: crawler::boxed,
        make_parser: parser::boxed,
    }
}
