//! Bounded parallel detail fetching.
//!
//! Each summary gets its own task holding a fresh browser page; a counting
//! semaphore enforces the `job_detail_concurrency` bound. Failures are
//! classified into a tagged outcome so the retry decision never matches on
//! error types at the call site: timeouts and generic errors retry with
//! exponential backoff, a lost browsing target never does. One task's
//! failure never cancels siblings; its slot simply yields `None`.
//!
//! Run cancellation is observed at every suspension point; a task closes
//! its page before honoring the signal, and the [`PageGuard`] backstops
//! the case where the whole fan-out future is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use rolescout_browser::{BrowserHandle, PageGuard};
use rolescout_platforms::Crawler;
use rolescout_shared::{JobDetail, JobSummary, RoleScoutError};

use crate::cancel::CancelSignal;

/// Attempt ceiling per detail URL.
const MAX_ATTEMPTS: u32 = 3;

/// Tagged outcome of a failed fetch attempt, driving the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// The page missed its navigation budget; worth retrying.
    RetriableTimeout,
    /// The browsing context is gone; retrying cannot help.
    TargetClosed,
    /// Anything else transport-shaped; retried like a timeout.
    Other,
    /// The run was cancelled; the task stops without retrying.
    Cancelled,
}

impl FetchFailure {
    pub fn classify(err: &RoleScoutError) -> Self {
        if err.is_target_closed() {
            Self::TargetClosed
        } else if err.is_timeout() {
            Self::RetriableTimeout
        } else {
            Self::Other
        }
    }
}

/// Fan out detail fetches for `summaries`, at most `concurrency` in flight.
///
/// The returned vector is aligned with `summaries`: slot `i` holds the
/// detail for summary `i`, or `None` if every attempt failed or the run was
/// cancelled. Completion order is unspecified internally; alignment
/// restores summary order.
pub async fn fetch_details(
    browser: Arc<dyn BrowserHandle>,
    crawler: Arc<dyn Crawler>,
    summaries: &[JobSummary],
    concurrency: usize,
    retry_backoff: Duration,
    cancel: &CancelSignal,
    mut on_complete: impl FnMut(usize, &str),
) -> Vec<Option<JobDetail>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks: JoinSet<(usize, Option<JobDetail>)> = JoinSet::new();

    for (index, summary) in summaries.iter().enumerate() {
        let browser = browser.clone();
        let crawler = crawler.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        let url = summary.detail_url.clone();

        tasks.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.acquire_owned() => permit.ok(),
            };
            let Some(_permit) = permit else {
                return (index, None);
            };
            let detail = fetch_with_retry(
                browser.as_ref(),
                crawler.as_ref(),
                &url,
                retry_backoff,
                &cancel,
            )
            .await;
            (index, detail)
        });
    }

    let mut details: Vec<Option<JobDetail>> = vec![None; summaries.len()];
    let mut completed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, detail)) => {
                completed += 1;
                on_complete(completed, &summaries[index].detail_url);
                details[index] = detail;
            }
            Err(e) => {
                warn!(error = %e, "detail task panicked");
            }
        }
    }
    details
}

/// Run up to [`MAX_ATTEMPTS`] fetch attempts with exponential backoff.
async fn fetch_with_retry(
    browser: &dyn BrowserHandle,
    crawler: &dyn Crawler,
    url: &str,
    base_backoff: Duration,
    cancel: &CancelSignal,
) -> Option<JobDetail> {
    let mut backoff = base_backoff;

    for attempt in 1..=MAX_ATTEMPTS {
        match fetch_once(browser, crawler, url, cancel).await {
            Ok(detail) => return Some(detail),
            Err(FetchFailure::TargetClosed) => {
                warn!(url, attempt, "browsing target closed, dropping record");
                return None;
            }
            Err(FetchFailure::Cancelled) => {
                debug!(url, attempt, "detail fetch cancelled");
                return None;
            }
            Err(kind) => {
                if attempt == MAX_ATTEMPTS {
                    warn!(url, attempt, ?kind, "detail fetch exhausted retries");
                    return None;
                }
                debug!(url, attempt, ?kind, backoff_ms = backoff.as_millis() as u64, "retrying detail fetch");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff *= 2;
            }
        }
    }
    None
}

/// One attempt: acquire a fresh page, fetch, and close the page on every
/// exit path — including the cancellation path, which closes before the
/// signal is honored.
async fn fetch_once(
    browser: &dyn BrowserHandle,
    crawler: &dyn Crawler,
    url: &str,
    cancel: &CancelSignal,
) -> std::result::Result<JobDetail, FetchFailure> {
    let page = browser.new_page().await.map_err(|e| {
        warn!(url, error = %e, "could not open detail page context");
        FetchFailure::classify(&e)
    })?;
    let guard = PageGuard::new(page);

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchFailure::Cancelled),
        fetched = crawler.fetch_detail(guard.page(), url) => fetched.map_err(|e| {
            warn!(url, error = %e, "detail fetch attempt failed");
            FetchFailure::classify(&e)
        }),
    };

    guard.close().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolescout_browser::testing::{DetailOutcome, PageScript, ScriptedBrowser};
    use rolescout_platforms::PlatformRegistry;
    use rolescout_shared::{AppConfig, RunRequest};
    use url::Url;

    fn summary(url: &str) -> JobSummary {
        JobSummary {
            title: "Analyst".into(),
            detail_url: url.into(),
            location_raw: String::new(),
            date_posted_raw: String::new(),
            location_parsed: String::new(),
            date_posted_parsed: None,
        }
    }

    fn detail_html(description: &str) -> String {
        format!(
            r#"<html><head><title>Posting</title></head><body>
               <div data-automation-id="jobPostingDescription">{description}</div>
               <div data-automation-id="requisitionId"><dd>REQ-1</dd></div>
               </body></html>"#
        )
    }

    fn crawler() -> Arc<dyn Crawler> {
        let app = AppConfig::default();
        let request = RunRequest {
            company_name: "Acme".into(),
            target_url: Url::parse("https://acme.wd1.myworkdayjobs.com/careers").unwrap(),
            platform: "workday".into(),
            max_pages: None,
            job_detail_concurrency: None,
        };
        Arc::from(
            PlatformRegistry::builtin()
                .create_crawler("workday", &app, &request)
                .unwrap(),
        )
    }

    #[test]
    fn classification_is_a_tagged_outcome() {
        let timeout = RoleScoutError::timeout("u", Duration::from_secs(60));
        assert_eq!(
            FetchFailure::classify(&timeout),
            FetchFailure::RetriableTimeout
        );

        let closed = RoleScoutError::TargetClosed("gone".into());
        assert_eq!(FetchFailure::classify(&closed), FetchFailure::TargetClosed);

        let other = RoleScoutError::Browser("flaky".into());
        assert_eq!(FetchFailure::classify(&other), FetchFailure::Other);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_retries_then_succeeds_and_target_closed_does_not() {
        let script = PageScript::scrolling(vec![])
            .with_detail_outcomes(
                "https://x.example/u1",
                vec![
                    DetailOutcome::Timeout,
                    DetailOutcome::Html(detail_html("first")),
                ],
            )
            .with_detail_outcomes("https://x.example/u2", vec![DetailOutcome::TargetClosed]);
        let browser = Arc::new(ScriptedBrowser::new(script));

        let summaries = vec![
            summary("https://x.example/u1"),
            summary("https://x.example/u2"),
        ];
        let details = fetch_details(
            browser.clone(),
            crawler(),
            &summaries,
            10,
            Duration::from_secs(2),
            &CancelSignal::new(),
            |_, _| {},
        )
        .await;

        assert_eq!(details.len(), 2);
        let u1 = details[0].as_ref().expect("u1 retried to success");
        assert_eq!(u1.description, "first");
        assert!(details[1].is_none(), "target-closed is never retried");

        // u1: 2 attempts, u2: 1 attempt; every page closed on exit.
        assert_eq!(browser.pages_opened(), 3);
        assert_eq!(browser.pages_closed(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_exhausts_three_attempts() {
        let script = PageScript::scrolling(vec![]).with_detail_outcomes(
            "https://x.example/u1",
            vec![DetailOutcome::Error("connection reset".into())],
        );
        let browser = Arc::new(ScriptedBrowser::new(script));

        let details = fetch_details(
            browser.clone(),
            crawler(),
            &[summary("https://x.example/u1")],
            10,
            Duration::from_secs(2),
            &CancelSignal::new(),
            |_, _| {},
        )
        .await;

        assert!(details[0].is_none());
        assert_eq!(browser.pages_opened(), 3);
        assert_eq!(browser.pages_closed(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_never_cancels_siblings() {
        let script = PageScript::scrolling(vec![])
            .with_detail_outcomes("https://x.example/u1", vec![DetailOutcome::TargetClosed])
            .with_detail("https://x.example/u2", detail_html("second"))
            .with_detail("https://x.example/u3", detail_html("third"));
        let browser = Arc::new(ScriptedBrowser::new(script));

        let summaries = vec![
            summary("https://x.example/u1"),
            summary("https://x.example/u2"),
            summary("https://x.example/u3"),
        ];
        let details = fetch_details(
            browser,
            crawler(),
            &summaries,
            1, // serialized; output must be identical
            Duration::from_secs(2),
            &CancelSignal::new(),
            |_, _| {},
        )
        .await;

        assert!(details[0].is_none());
        assert_eq!(details[1].as_ref().unwrap().description, "second");
        assert_eq!(details[2].as_ref().unwrap().description, "third");
    }

    #[tokio::test(start_paused = true)]
    async fn results_align_with_summary_order() {
        let mut script = PageScript::scrolling(vec![]);
        for i in 0..8 {
            script = script.with_detail(
                format!("https://x.example/job/{i}"),
                detail_html(&format!("desc-{i}")),
            );
        }
        let browser = Arc::new(ScriptedBrowser::new(script));

        let summaries: Vec<JobSummary> = (0..8)
            .map(|i| summary(&format!("https://x.example/job/{i}")))
            .collect();
        let details = fetch_details(
            browser,
            crawler(),
            &summaries,
            4,
            Duration::from_secs(2),
            &CancelSignal::new(),
            |_, _| {},
        )
        .await;

        for (i, slot) in details.iter().enumerate() {
            assert_eq!(slot.as_ref().unwrap().description, format!("desc-{i}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_closes_pages_and_yields_no_details() {
        let script = PageScript::scrolling(vec![])
            .with_detail_outcomes("https://x.example/u1", vec![DetailOutcome::Hang])
            .with_detail_outcomes("https://x.example/u2", vec![DetailOutcome::Hang]);
        let browser = Arc::new(ScriptedBrowser::new(script));
        let cancel = CancelSignal::new();

        let summaries = vec![
            summary("https://x.example/u1"),
            summary("https://x.example/u2"),
        ];
        let fetches = fetch_details(
            browser.clone(),
            crawler(),
            &summaries,
            10,
            Duration::from_secs(2),
            &cancel,
            |_, _| {},
        );
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        };

        let (details, ()) = tokio::join!(fetches, trigger);

        assert!(details.iter().all(Option::is_none));
        // Both hung tasks closed their pages before honoring the signal.
        assert_eq!(browser.pages_opened(), 2);
        assert_eq!(browser.pages_closed(), 2);
    }
}
