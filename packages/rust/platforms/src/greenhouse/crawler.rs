//! Greenhouse listing crawler.

use async_trait::async_trait;
use chrono::Local;
use tracing::instrument;
use url::Url;

use rolescout_browser::DrivenPage;
use rolescout_shared::{JobDetail, JobSummary, Result};

use super::parser::GreenhouseParser;
use crate::{Crawler, CrawlerConfig, listing};

/// Crawls a Greenhouse board. The boards rarely paginate, so runs usually
/// take the scroll-to-load path of the shared machinery.
pub struct GreenhouseCrawler {
    config: CrawlerConfig,
    parser: GreenhouseParser,
}

impl GreenhouseCrawler {
    /// Build a crawler; the embedded parser captures `today` at run start.
    pub fn new(config: CrawlerConfig) -> Self {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Build a crawler with an explicit reference date (tests, replays).
    pub fn with_today(config: CrawlerConfig, today: chrono::NaiveDate) -> Self {
        Self {
            config,
            parser: GreenhouseParser::new(today),
        }
    }
}

/// Constructor slot for the registry binding.
pub fn boxed(config: CrawlerConfig) -> Box<dyn Crawler> {
    Box::new(GreenhouseCrawler::new(config))
}

#[async_trait]
impl Crawler for GreenhouseCrawler {
    fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    #[instrument(skip_all, fields(platform = "greenhouse", company = company_name))]
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rolescout_shared::{AppConfig, RunRequest};

    fn crawler() -> GreenhouseCrawler {
        let app = AppConfig::default();
        let request = RunRequest {
            company_name: "Acme Capital".into(),
            target_url: Url::parse("https://job-boards.greenhouse.io/acmecapital").unwrap(),
            platform: "greenhouse".into(),
            max_pages: None,
            job_detail_concurrency: None,
        };
        let config = CrawlerConfig::merged(&app, &super::super::config::defaults(), &request);
        GreenhouseCrawler::with_today(config, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
    }

    #[test]
    fn extracts_greenhouse_markup_and_skips_department_rows() {
        let html = r#"<div class="job-posts"><table><tbody>
          <tr class="job-post"><td class="cell"><p>Trading</p></td></tr>
          <tr class="job-post">
            <td class="cell">
              <a href="/acmecapital/jobs/410021"><p>Execution Trader</p></a>
              <p class="body--metadata">Office: Amsterdam</p>
              <p class="body--posted">Posted 5 days ago</p>
            </td>
          </tr>
        </tbody></table></div>"#;

        let base = Url::parse("https://job-boards.greenhouse.io/acmecapital").unwrap();
        let cards = crawler().extract_summaries(html, &base);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Execution Trader");
        assert_eq!(
            cards[0].detail_url,
            "https://job-boards.greenhouse.io/acmecapital/jobs/410021"
        );
        assert_eq!(cards[0].location_parsed, "Amsterdam");
        assert_eq!(
            cards[0].date_posted_parsed,
            NaiveDate::from_ymd_opt(2026, 7, 27)
        );
    }
}
