//! Listing-page navigation utilities: pagination probe, next-page clicks,
//! and scroll-to-load for infinite-scroll boards.
//!
//! DOM inspection happens on HTML snapshots via `scraper`, kept inside
//! synchronous helpers so the async call paths stay `Send`.

use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use rolescout_shared::Result;

use crate::DrivenPage;

/// Budgets for the scroll-to-load loop.
#[derive(Debug, Clone)]
pub struct ScrollBudget {
    /// Hard cap on scroll attempts.
    pub max_attempts: u32,
    /// Consecutive no-progress scrolls that end the loop.
    pub no_progress_limit: u32,
    /// Settle time after each scroll step.
    pub settle: Duration,
}

impl Default for ScrollBudget {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            no_progress_limit: 5,
            settle: Duration::from_secs(1),
        }
    }
}

/// Count elements matching `selector` in an HTML snapshot.
///
/// An unparsable selector counts as zero matches (and warns) so a bad
/// platform config degrades a page instead of aborting the run.
pub fn count_matches(html: &str, selector: &str) -> usize {
    let Ok(sel) = Selector::parse(selector) else {
        warn!(selector, "invalid selector, counting zero matches");
        return 0;
    };
    Html::parse_document(html).select(&sel).count()
}

/// Probe for a pagination nav container within `budget`.
pub async fn has_pagination(page: &dyn DrivenPage, selector: &str, budget: Duration) -> bool {
    match page.wait_for(selector, budget).await {
        Ok(()) => true,
        Err(e) => {
            debug!(selector, error = %e, "no pagination container");
            false
        }
    }
}

/// Click the next-page button if it exists and is enabled.
///
/// Returns `Ok(false)` when the button is absent or disabled (end of the
/// listing). The caller re-waits for the listing container after a click.
pub async fn click_next(page: &dyn DrivenPage, selector: &str) -> Result<bool> {
    let html = page.content().await?;
    if !next_button_enabled(&html, selector) {
        return Ok(false);
    }
    page.click(selector).await?;
    Ok(true)
}

/// Whether the next button is present with a falsy `disabled` state.
fn next_button_enabled(html: &str, selector: &str) -> bool {
    let Ok(sel) = Selector::parse(selector) else {
        warn!(selector, "invalid next-button selector");
        return false;
    };
    let doc = Html::parse_document(html);
    let Some(button) = doc.select(&sel).next() else {
        return false;
    };

    if let Some(disabled) = button.value().attr("disabled") {
        if !disabled.eq_ignore_ascii_case("false") {
            return false;
        }
    }
    if button
        .value()
        .attr("aria-disabled")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return false;
    }
    true
}

/// Scroll until the job-item count saturates.
///
/// Each iteration scrolls to the document end, settles, and recounts items
/// matching `item_selector`; the loop ends after
/// [`ScrollBudget::no_progress_limit`] consecutive counts without growth or
/// at the attempt cap. Returns the final item count.
pub async fn scroll_to_load(
    page: &dyn DrivenPage,
    item_selector: &str,
    budget: &ScrollBudget,
) -> Result<usize> {
    let mut count = count_matches(&page.content().await?, item_selector);
    let mut no_progress = 0u32;

    for attempt in 0..budget.max_attempts {
        page.scroll_to_end().await?;
        tokio::time::sleep(budget.settle).await;

        let new_count = count_matches(&page.content().await?, item_selector);
        if new_count > count {
            no_progress = 0;
        } else {
            no_progress += 1;
        }
        debug!(attempt, count = new_count, no_progress, "scroll step");
        count = new_count;

        if no_progress >= budget.no_progress_limit {
            break;
        }
    }

    Ok(count)
}
