//! Workday listing crawler.

use async_trait::async_trait;
use chrono::Local;
use tracing::instrument;
use url::Url;

use rolescout_browser::DrivenPage;
use rolescout_shared::{JobDetail, JobSummary, Result};

use super::parser::WorkdayParser;
use crate::{Crawler, CrawlerConfig, listing};

/// Crawls a Workday-hosted board through the shared listing machinery,
/// bound to Workday's `data-automation-id` selector table.
pub struct WorkdayCrawler {
    config: CrawlerConfig,
    parser: WorkdayParser,
}

impl WorkdayCrawler {
    /// Build a crawler; the embedded parser captures `today` at run start.
    pub fn new(config: CrawlerConfig) -> Self {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Build a crawler with an explicit reference date (tests, replays).
    pub fn with_today(config: CrawlerConfig, today: chrono::NaiveDate) -> Self {
        Self {
            config,
            parser: WorkdayParser::new(today),
        }
    }
}

/// Constructor slot for the registry binding.
pub fn boxed(config: CrawlerConfig) -> Box<dyn Crawler> {
    Box::new(WorkdayCrawler::new(config))
}

#[async_trait]
impl Crawler for WorkdayCrawler {
    fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    #[instrument(skip_all, fields(platform = "workday", company = company_name))]
    async fn paginate(
        &self,
        page: &dyn DrivenPage,
        company_name: &str,
        base_url: &Url,
        max_pages: Option<u32>,
    ) -> Result<Vec<JobSummary>> {
        listing::collect_summaries(
            page,
            &self.config,
            &self.parser,
            company_name,
            base_url,
            max_pages,
        )
        .await
    }

    async fn fetch_detail(&self, page: &dyn DrivenPage, url: &str) -> Result<JobDetail> {
        listing::fetch_detail(page, &self.config, &self.parser, url).await
    }

    fn extract_summaries(&self, html: &str, base_url: &Url) -> Vec<JobSummary> {
        listing::extract_cards(html, &self.config.selectors, &self.parser, base_url)
    }
}
