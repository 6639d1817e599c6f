//! Platform plug-in framework: the Crawler/Parser contracts, the explicit
//! registry that binds platform implementations to them, and the built-in
//! platforms.
//!
//! Each platform is a module with the artifact triple `crawler` / `parser` /
//! `config`, joined to the registry by its `binding()` init routine. The
//! core never sees platform selectors; it drives the contracts only.

pub mod greenhouse;
pub mod listing;
pub mod normalize;
pub mod registry;
pub mod workday;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::Selector;
use url::Url;

use rolescout_browser::{DrivenPage, ScrollBudget};
use rolescout_shared::{AppConfig, JobDetail, JobSummary, Result, RunRequest};

pub use registry::{PlatformBinding, PlatformRegistry};

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Platform-specific listing crawler.
///
/// Transport-level failures (navigation timeout, lost target) surface so the
/// orchestrator's retry wrapper can classify them; extraction misses degrade
/// to `"N/A"` fields or skipped cards instead of erroring.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// The merged configuration this crawler was built with.
    fn config(&self) -> &CrawlerConfig;

    /// Drive the listing index and return every extracted summary, in
    /// crawl order. Per-page extraction failures contribute zero summaries
    /// and never abort the run.
    async fn paginate(
        &self,
        page: &dyn DrivenPage,
        company_name: &str,
        base_url: &Url,
        max_pages: Option<u32>,
    ) -> Result<Vec<JobSummary>>;

    /// Load one detail page and extract description, job id, and header
    /// title, degrading individual fields to `"N/A"` on extraction misses.
    async fn fetch_detail(&self, page: &dyn DrivenPage, url: &str) -> Result<JobDetail>;

    /// Extract summaries from a listing-page snapshot. Cards with a missing
    /// title are skipped silently.
    fn extract_summaries(&self, html: &str, base_url: &Url) -> Vec<JobSummary>;
}

/// Platform-specific string normalizer.
///
/// Relative date arithmetic uses a `today` captured once at run start.
pub trait Parser: Send + Sync {
    /// Normalize a raw posted-date string to a calendar date, or `None`.
    fn parse_date(&self, raw: &str) -> Option<NaiveDate>;

    /// Clean a raw location string. Idempotent; empty input yields empty.
    fn parse_location(&self, raw: &str) -> String;

    /// Strip vendor prefixes from a raw job-id string. Never fails.
    fn parse_job_id(&self, raw: &str) -> String;
}

// ---------------------------------------------------------------------------
// Selector table
// ---------------------------------------------------------------------------

/// The DOM selectors a platform's `config` artifact supplies.
///
/// Opaque to the core; consumed only inside the crawler.
#[derive(Debug, Clone)]
pub struct SelectorTable {
    pub listing_container: String,
    pub listing_item: String,
    pub title_link: String,
    pub location_cell: String,
    pub date_posted_cell: String,
    pub pagination_container: String,
    pub next_button: String,
    pub job_description: String,
    pub job_id_display: String,
}

impl SelectorTable {
    fn fields(&self) -> [(&'static str, &str); 9] {
        [
            ("listing_container", &self.listing_container),
            ("listing_item", &self.listing_item),
            ("title_link", &self.title_link),
            ("location_cell", &self.location_cell),
            ("date_posted_cell", &self.date_posted_cell),
            ("pagination_container", &self.pagination_container),
            ("next_button", &self.next_button),
            ("job_description", &self.job_description),
            ("job_id_display", &self.job_id_display),
        ]
    }

    /// Instantiation probe: every selector must be present and parsable.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(format!("selector '{name}' is empty"));
            }
            if Selector::parse(value).is_err() {
                return Err(format!("selector '{name}' does not parse: {value}"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Crawler configuration
// ---------------------------------------------------------------------------

/// Per-platform defaults contributed to the config merge.
#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    pub selectors: SelectorTable,
    /// Platform override of the general `job_detail_concurrency` default.
    pub job_detail_concurrency: Option<usize>,
}

/// The merged value config passed to a crawler constructor.
///
/// Merge precedence, lowest to highest: general defaults → platform
/// defaults → run-supplied overrides.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub selectors: SelectorTable,
    pub job_detail_concurrency: usize,
    /// Detail-page navigation ceiling.
    pub navigation: Duration,
    /// Listing-page initial navigation budget.
    pub listing_nav: Duration,
    /// Budget for required-selector waits.
    pub selector_wait: Duration,
    /// Budget for the pagination-presence probe.
    pub pagination_probe: Duration,
    /// Delay between listing pages.
    pub inter_page_delay: Duration,
    /// Scroll-to-load budgets.
    pub scroll: ScrollBudget,
    /// Base backoff between detail retry attempts.
    pub retry_backoff: Duration,
}

impl CrawlerConfig {
    /// Merge the three config layers for one run.
    pub fn merged(app: &AppConfig, platform: &PlatformDefaults, request: &RunRequest) -> Self {
        let t = &app.timeouts;
        Self {
            selectors: platform.selectors.clone(),
            job_detail_concurrency: request
                .job_detail_concurrency
                .or(platform.job_detail_concurrency)
                .unwrap_or(app.defaults.job_detail_concurrency),
            navigation: Duration::from_secs(t.navigation_secs),
            listing_nav: Duration::from_secs(t.listing_nav_secs),
            selector_wait: Duration::from_secs(t.selector_wait_secs),
            pagination_probe: Duration::from_secs(t.pagination_probe_secs),
            inter_page_delay: Duration::from_millis(t.inter_page_delay_ms),
            scroll: ScrollBudget {
                max_attempts: t.scroll_max_attempts,
                no_progress_limit: t.scroll_no_progress_limit,
                settle: Duration::from_millis(t.scroll_settle_ms),
            },
            retry_backoff: Duration::from_millis(t.retry_backoff_ms),
        }
    }
}
