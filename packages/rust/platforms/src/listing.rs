//! Shared listing-crawl machinery the platform crawlers compose: container
//! waits, pagination-type detection, the numbered and scrolled crawl paths,
//! and card/detail extraction from HTML snapshots.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use rolescout_browser::{DrivenPage, NavWait, click_next, has_pagination, scroll_to_load};
use rolescout_shared::{JobDetail, JobSummary, NOT_AVAILABLE, Result};

use crate::{CrawlerConfig, Parser, SelectorTable};

// ---------------------------------------------------------------------------
// Pagination driving
// ---------------------------------------------------------------------------

/// Drive the listing index and collect summaries in crawl order.
///
/// Detects the board's layout by probing for the pagination nav container,
/// then either walks numbered pages or scrolls to saturation. Pages that
/// yield no cards contribute zero summaries; only a lost browsing target
/// aborts.
pub async fn collect_summaries(
    page: &dyn DrivenPage,
    config: &CrawlerConfig,
    parser: &dyn Parser,
    company_name: &str,
    base_url: &Url,
    max_pages: Option<u32>,
) -> Result<Vec<JobSummary>> {
    if max_pages == Some(0) {
        return Ok(Vec::new());
    }

    let selectors = &config.selectors;
    if let Err(e) = page
        .wait_for(&selectors.listing_container, config.selector_wait)
        .await
    {
        if e.is_target_closed() {
            return Err(e);
        }
        warn!(company = company_name, error = %e, "listing container never appeared");
        return Ok(Vec::new());
    }

    let paginated =
        has_pagination(page, &selectors.pagination_container, config.pagination_probe).await;
    debug!(company = company_name, paginated, "listing layout detected");

    let summaries = if paginated {
        walk_numbered_pages(page, config, parser, base_url, max_pages).await?
    } else {
        let count = scroll_to_load(page, &selectors.listing_item, &config.scroll).await?;
        debug!(company = company_name, count, "scroll saturated");
        let html = page.content().await?;
        extract_cards(&html, selectors, parser, base_url)
    };

    info!(
        company = company_name,
        count = summaries.len(),
        paginated,
        "listing crawl complete"
    );
    Ok(summaries)
}

/// Walk numbered pages until the next button dies, `max_pages` is reached,
/// or a page stops rendering.
async fn walk_numbered_pages(
    page: &dyn DrivenPage,
    config: &CrawlerConfig,
    parser: &dyn Parser,
    base_url: &Url,
    max_pages: Option<u32>,
) -> Result<Vec<JobSummary>> {
    let selectors = &config.selectors;
    let mut summaries = Vec::new();
    let mut page_no: u32 = 1;

    loop {
        let html = page.content().await?;
        let extracted = extract_cards(&html, selectors, parser, base_url);
        if extracted.is_empty() {
            warn!(page = page_no, "listing page yielded no job cards");
        }
        summaries.extend(extracted);

        if max_pages.is_some_and(|max| page_no >= max) {
            break;
        }

        match click_next(page, &selectors.next_button).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_target_closed() => return Err(e),
            Err(e) => {
                warn!(page = page_no, error = %e, "next-page click failed");
                break;
            }
        }

        if let Err(e) = page
            .wait_for(&selectors.listing_container, config.selector_wait)
            .await
        {
            if e.is_target_closed() {
                return Err(e);
            }
            warn!(page = page_no + 1, error = %e, "next listing page never rendered");
            break;
        }

        tokio::time::sleep(config.inter_page_delay).await;
        page_no += 1;
    }

    Ok(summaries)
}

// ---------------------------------------------------------------------------
// Card extraction
// ---------------------------------------------------------------------------

/// Extract job cards from a listing-page snapshot, preserving DOM order.
pub fn extract_cards(
    html: &str,
    selectors: &SelectorTable,
    parser: &dyn Parser,
    base_url: &Url,
) -> Vec<JobSummary> {
    let Ok(item_sel) = Selector::parse(&selectors.listing_item) else {
        warn!(selector = %selectors.listing_item, "invalid listing_item selector");
        return Vec::new();
    };
    let Ok(title_sel) = Selector::parse(&selectors.title_link) else {
        warn!(selector = %selectors.title_link, "invalid title_link selector");
        return Vec::new();
    };
    let location_sel = Selector::parse(&selectors.location_cell).ok();
    let date_sel = Selector::parse(&selectors.date_posted_cell).ok();

    let doc = Html::parse_document(html);
    let mut cards = Vec::new();

    for item in doc.select(&item_sel) {
        let Some(link) = item.select(&title_sel).next() else {
            continue;
        };
        let title = text_of(&link);
        if title.is_empty() {
            continue;
        }

        let detail_url = link
            .value()
            .attr("href")
            .map(|href| resolve_detail_url(href, base_url))
            .unwrap_or_default();

        let location_raw = cell_text(&item, location_sel.as_ref());
        let date_posted_raw = cell_text(&item, date_sel.as_ref());

        cards.push(JobSummary {
            title,
            detail_url,
            location_parsed: parser.parse_location(&location_raw),
            date_posted_parsed: parser.parse_date(&date_posted_raw),
            location_raw,
            date_posted_raw,
        });
    }

    cards
}

/// Build an absolute detail URL from a card's href.
///
/// Absolute hrefs pass through; `/…` is joined to the listing origin;
/// anything else is appended to the listing base URL.
pub fn resolve_detail_url(href: &str, base_url: &Url) -> String {
    let href = href.trim();
    if href.starts_with("http") {
        return href.to_string();
    }
    if let Some(stripped) = href.strip_prefix('/') {
        let origin = base_url.origin().ascii_serialization();
        return format!("{origin}/{stripped}");
    }
    format!("{}/{}", base_url.as_str().trim_end_matches('/'), href)
}

fn cell_text(item: &ElementRef<'_>, selector: Option<&Selector>) -> String {
    selector
        .and_then(|sel| item.select(sel).next())
        .map(|el| text_of(&el))
        .unwrap_or_default()
}

fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ---------------------------------------------------------------------------
// Detail extraction
// ---------------------------------------------------------------------------

/// Load one detail page and extract its fields.
///
/// Navigation-level failures surface to the caller's retry wrapper; a
/// description that never appears degrades the affected fields to `"N/A"`.
pub async fn fetch_detail(
    page: &dyn DrivenPage,
    config: &CrawlerConfig,
    parser: &dyn Parser,
    url: &str,
) -> Result<JobDetail> {
    page.goto(url, NavWait::DomContentLoaded, config.navigation)
        .await?;

    if let Err(e) = page
        .wait_for(&config.selectors.job_description, config.selector_wait)
        .await
    {
        if e.is_target_closed() {
            return Err(e);
        }
        warn!(url, error = %e, "job description never appeared");
    }

    let html = page.content().await?;
    let header_title = page.page_title().await.unwrap_or_default();
    Ok(extract_detail(&html, &header_title, &config.selectors, parser, url))
}

/// Extract detail fields from a snapshot, degrading misses to `"N/A"`.
pub fn extract_detail(
    html: &str,
    header_title: &str,
    selectors: &SelectorTable,
    parser: &dyn Parser,
    url: &str,
) -> JobDetail {
    let doc = Html::parse_document(html);

    let description = Selector::parse(&selectors.job_description)
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| text_of(&el))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let job_id = Selector::parse(&selectors.job_id_display)
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| parser.parse_job_id(&text_of(&el)))
        .filter(|id| !id.is_empty())
        .or_else(|| job_id_text_fallback(&doc, parser))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let detail_page_title = if header_title.trim().is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        header_title.trim().to_string()
    };

    JobDetail {
        url: url.to_string(),
        description,
        job_id,
        detail_page_title,
    }
}

/// Textual fallback: scan the page text for a `job id` label when the
/// primary selector misses.
fn job_id_text_fallback(doc: &Html, parser: &dyn Parser) -> Option<String> {
    let body_sel = Selector::parse("body").expect("body selector");
    let body = doc.select(&body_sel).next()?;
    for chunk in body.text() {
        let line = chunk.trim();
        if line.to_lowercase().starts_with("job id") {
            let id = parser.parse_job_id(line);
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}
