//! End-to-end scrape pipeline:
//! paginate → prepare enrichment cache → parallel detail fan-out →
//! decorate → filter → sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use rolescout_browser::{BrowserHandle, PageGuard, navigate_lenient};
use rolescout_enrich::{EnrichmentEngine, EnrichmentState};
use rolescout_platforms::{Crawler, PlatformRegistry};
use rolescout_shared::{AppConfig, JobRecord, JobSummary, Result, RoleScoutError, RunId, RunRequest};

use crate::cancel::CancelSignal;
use crate::fanout;
use crate::filter;
use crate::sink::RecordSink;

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Tally of one scrape run, reported even when nothing fatal occurred.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub company_name: String,
    pub platform: String,
    /// Summaries extracted from the listing index.
    pub summaries_found: usize,
    /// Summaries with a detail URL that entered the fan-out.
    pub details_attempted: usize,
    /// Detail tasks that exhausted retries or hit a closed target.
    pub details_failed: usize,
    pub duplicates_dropped: usize,
    pub stale_dropped: usize,
    /// Records handed to the sink.
    pub records_emitted: usize,
    pub enrichment_state: EnrichmentState,
    pub enrichment_batch_calls: usize,
    pub elapsed: Duration,
}

impl RunReport {
    /// Stats payload for run history rows.
    pub fn stats_json(&self) -> serde_json::Value {
        serde_json::json!({
            "summaries_found": self.summaries_found,
            "details_attempted": self.details_attempted,
            "details_failed": self.details_failed,
            "duplicates_dropped": self.duplicates_dropped,
            "stale_dropped": self.stale_dropped,
            "records_emitted": self.records_emitted,
            "enrichment_state": self.enrichment_state.to_string(),
            "enrichment_batch_calls": self.enrichment_batch_calls,
            "elapsed_ms": self.elapsed.as_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status. Observational only;
/// its absence must not change results.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each detail task completes.
    fn detail_fetched(&self, current: usize, total: usize, url: &str);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail_fetched(&self, _current: usize, _total: usize, _url: &str) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full scrape pipeline for one `(company, target_url, platform)`
/// triple.
///
/// The sink is invoked exactly once, after all crawl and enrichment work
/// completes; its failure surfaces without re-running pipeline work.
///
/// Triggering `cancel` propagates to every in-flight task; each closes its
/// browser page before honoring the signal, the run yields
/// [`RoleScoutError::Cancelled`], and the sink is never invoked.
#[instrument(skip_all, fields(company = %request.company_name, platform = %request.platform))]
pub async fn run_scrape(
    request: &RunRequest,
    app: &AppConfig,
    registry: &PlatformRegistry,
    browser: Arc<dyn BrowserHandle>,
    mut enrichment: EnrichmentEngine,
    sink: &dyn RecordSink,
    progress: &dyn ProgressReporter,
    cancel: &CancelSignal,
) -> Result<RunReport> {
    request.validate()?;
    if cancel.is_cancelled() {
        return Err(RoleScoutError::Cancelled);
    }
    let started = Instant::now();
    let run_id = RunId::new();

    let crawler: Arc<dyn Crawler> =
        Arc::from(registry.create_crawler(&request.platform, app, request)?);
    let config = crawler.config().clone();

    info!(
        %run_id,
        url = %request.target_url,
        sink = %sink.describe(),
        concurrency = config.job_detail_concurrency,
        "starting scrape run"
    );

    // --- Phase 1: listing crawl ---
    progress.phase("Crawling listing index");
    let guard = PageGuard::new(browser.new_page().await?);
    let listing_result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RoleScoutError::Cancelled),
        result = async {
            navigate_lenient(
                guard.page(),
                request.target_url.as_str(),
                config.listing_nav,
            )
            .await?;
            crawler
                .paginate(
                    guard.page(),
                    &request.company_name,
                    &request.target_url,
                    request.max_pages,
                )
                .await
        } => result,
    };
    guard.close().await;
    let summaries = listing_result?;

    // --- Phase 2: batch enrichment prep (before any detail task runs) ---
    if cancel.is_cancelled() {
        return Err(RoleScoutError::Cancelled);
    }
    progress.phase("Resolving locations");
    enrichment.prepare_cache(&summaries).await;

    // --- Phase 3: parallel detail fan-out ---
    let eligible: Vec<JobSummary> = summaries
        .iter()
        .filter(|s| !s.detail_url.is_empty())
        .cloned()
        .collect();
    let details_attempted = eligible.len();

    progress.phase("Fetching job details");
    let details = fanout::fetch_details(
        browser.clone(),
        crawler.clone(),
        &eligible,
        config.job_detail_concurrency,
        config.retry_backoff,
        cancel,
        |current, url| progress.detail_fetched(current, details_attempted, url),
    )
    .await;

    // --- Phase 4: merge + decorate ---
    let mut records: Vec<JobRecord> = Vec::with_capacity(details_attempted);
    let mut details_failed = 0usize;
    for (summary, slot) in eligible.into_iter().zip(details.into_iter()) {
        match slot {
            Some(detail) => {
                let record = JobRecord::merge(&request.company_name, summary, detail);
                records.push(enrichment.decorate(record).await);
            }
            None => details_failed += 1,
        }
    }

    // --- Phase 5: filter ---
    let outcome = filter::filter_records(records);

    // --- Phase 6: sink (never reached by a cancelled run) ---
    if cancel.is_cancelled() {
        info!(%run_id, "run cancelled, emitting no persisted output");
        return Err(RoleScoutError::Cancelled);
    }
    progress.phase("Persisting records");
    sink.persist(&outcome.records, &run_id).await?;

    let report = RunReport {
        run_id,
        company_name: request.company_name.clone(),
        platform: request.platform.clone(),
        summaries_found: summaries.len(),
        details_attempted,
        details_failed,
        duplicates_dropped: outcome.duplicates_dropped,
        stale_dropped: outcome.stale_dropped,
        records_emitted: outcome.records.len(),
        enrichment_state: enrichment.state(),
        enrichment_batch_calls: enrichment.batch_calls(),
        elapsed: started.elapsed(),
    };

    info!(
        run_id = %report.run_id,
        summaries = report.summaries_found,
        emitted = report.records_emitted,
        failed = report.details_failed,
        duplicates = report.duplicates_dropped,
        stale = report.stale_dropped,
        enrichment = %report.enrichment_state,
        batch_calls = report.enrichment_batch_calls,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "scrape run complete"
    );
    progress.done(&report);

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rolescout_browser::testing::{DetailOutcome, PageScript, ScriptedBrowser};
    use rolescout_enrich::LocationModelClient;
    use rolescout_platforms::workday;
    use rolescout_shared::{RoleScoutError, StructuredLocation};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const LONDON_RAW: &str = "Locations: London, UK";

    // -- scripted HTML ----------------------------------------------------

    fn listing_page(cards: &[(&str, &str, &str)], next_enabled: Option<bool>) -> String {
        let items: String = cards
            .iter()
            .map(|(title, href, date)| {
                format!(
                    r#"<li>
                      <a data-automation-id="jobTitle" href="{href}">{title}</a>
                      <div data-automation-id="locations"><dd>{LONDON_RAW}</dd></div>
                      <div data-automation-id="postedOn"><dd>{date}</dd></div>
                    </li>"#
                )
            })
            .collect();
        let nav = match next_enabled {
            Some(true) => {
                r#"<nav aria-label="pagination"><button aria-label="next">Next</button></nav>"#
                    .to_string()
            }
            Some(false) => {
                r#"<nav aria-label="pagination"><button aria-label="next" disabled>Next</button></nav>"#
                    .to_string()
            }
            None => String::new(),
        };
        format!(
            r#"<html><body>
               <section data-automation-id="jobResults"><ul>{items}</ul></section>
               {nav}
               </body></html>"#
        )
    }

    fn detail_page(description: &str) -> String {
        format!(
            r#"<html><head><title>{description} - Acme Careers</title></head><body>
               <div data-automation-id="jobPostingDescription">{description}</div>
               <div data-automation-id="requisitionId"><dd>REQ-9</dd></div>
               </body></html>"#
        )
    }

    // -- doubles ----------------------------------------------------------

    struct CollectingSink {
        records: Mutex<Vec<JobRecord>>,
        persist_calls: AtomicUsize,
        fail: bool,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                persist_calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn records(&self) -> Vec<JobRecord> {
            self.records.lock().unwrap().clone()
        }

        fn persist_calls(&self) -> usize {
            self.persist_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordSink for CollectingSink {
        async fn persist(&self, records: &[JobRecord], _run_id: &RunId) -> Result<()> {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RoleScoutError::Sink("disk full".into()));
            }
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(())
        }

        fn describe(&self) -> String {
            "test:collecting".into()
        }
    }

    struct BatchOnlyClient {
        map: HashMap<String, StructuredLocation>,
        batch_calls: AtomicUsize,
    }

    impl BatchOnlyClient {
        fn london() -> Arc<Self> {
            let location = StructuredLocation {
                city: Some("London".into()),
                country: Some("United Kingdom".into()),
                region: Some("Europe".into()),
                confidence: 0.95,
            };
            Arc::new(Self {
                map: HashMap::from([(LONDON_RAW.to_string(), location)]),
                batch_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LocationModelClient for BatchOnlyClient {
        async fn resolve_batch(
            &self,
            _locations: &[String],
        ) -> Result<HashMap<String, StructuredLocation>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.map.clone())
        }

        async fn resolve_one(&self, _raw: &str) -> Result<Option<StructuredLocation>> {
            Err(RoleScoutError::Enrichment(
                "per-record path must stay cold".into(),
            ))
        }
    }

    // -- harness ----------------------------------------------------------

    fn request(max_pages: Option<u32>, concurrency: Option<usize>) -> RunRequest {
        RunRequest {
            company_name: "Acme Capital".into(),
            target_url: Url::parse("https://acme.wd1.myworkdayjobs.com/en-US/careers").unwrap(),
            platform: "workday".into(),
            max_pages,
            job_detail_concurrency: concurrency,
        }
    }

    async fn run(
        script: PageScript,
        req: &RunRequest,
        enrichment: EnrichmentEngine,
        sink: &CollectingSink,
    ) -> Result<RunReport> {
        let browser = Arc::new(ScriptedBrowser::new(script));
        run_scrape(
            req,
            &AppConfig::default(),
            &PlatformRegistry::builtin(),
            browser,
            enrichment,
            sink,
            &SilentProgress,
            &CancelSignal::new(),
        )
        .await
    }

    // -- scenarios --------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn paginated_run_with_enrichment_disabled() {
        let u = |n: u32| format!("https://acme.wd1.myworkdayjobs.com/job/{n}");
        let script = PageScript::paginated(
            vec![
                listing_page(
                    &[("A", "/job/1", "Posted 2 Days Ago"), ("B", "/job/2", "Posted 2 Days Ago")],
                    Some(true),
                ),
                listing_page(&[("C", "/job/3", "Posted 2 Days Ago")], Some(false)),
            ],
            workday::config::NEXT_BUTTON,
        )
        .with_detail(u(1), detail_page("da"))
        .with_detail(u(2), detail_page("db"))
        .with_detail(u(3), detail_page("dc"));

        let sink = CollectingSink::new();
        let report = run(script, &request(None, None), EnrichmentEngine::disabled(), &sink)
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert_eq!(
            records
                .iter()
                .map(|r| r.description.as_str())
                .collect::<Vec<_>>(),
            vec!["da", "db", "dc"]
        );
        assert!(records.iter().all(|r| r.location_parsed_intelligent.is_none()));
        assert!(records.iter().all(|r| r.company_name == "Acme Capital"));

        assert_eq!(report.summaries_found, 3);
        assert_eq!(report.records_emitted, 3);
        assert_eq!(report.enrichment_batch_calls, 0);
        assert_eq!(report.enrichment_state, EnrichmentState::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn infinite_scroll_run_with_shared_location() {
        let cards: Vec<(String, String)> = (1..=5)
            .map(|n| {
                (
                    format!("Role {n}"),
                    format!("https://acme.wd1.myworkdayjobs.com/job/{n}"),
                )
            })
            .collect();
        let card_refs: Vec<(&str, &str, &str)> = cards
            .iter()
            .map(|(title, url)| (title.as_str(), url.as_str(), "Posted Today"))
            .collect();

        let mut script = PageScript::scrolling(vec![listing_page(&card_refs, None)]);
        for (_, url) in &cards {
            script = script.with_detail(url.clone(), detail_page("desc"));
        }

        let client = BatchOnlyClient::london();
        let sink = CollectingSink::new();
        let report = run(
            script,
            &request(None, None),
            EnrichmentEngine::active(client.clone()),
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(client.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.enrichment_batch_calls, 1);
        assert_eq!(report.enrichment_state, EnrichmentState::Active);

        let records = sink.records();
        assert_eq!(records.len(), 5);
        for record in &records {
            assert_eq!(record.location_parsed, "London, UK");
            let loc = record
                .location_parsed_intelligent
                .as_ref()
                .expect("all records share the cached resolution");
            assert_eq!(loc.city.as_deref(), Some("London"));
            assert_eq!(loc.country.as_deref(), Some("United Kingdom"));
            assert_eq!(loc.region.as_deref(), Some("Europe"));
            assert!(loc.confidence >= 0.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_on_timeout_but_not_on_target_closed() {
        let u1 = "https://acme.wd1.myworkdayjobs.com/job/1";
        let u2 = "https://acme.wd1.myworkdayjobs.com/job/2";
        let script = PageScript::paginated(
            vec![listing_page(
                &[("A", "/job/1", "Posted Today"), ("B", "/job/2", "Posted Today")],
                Some(false),
            )],
            workday::config::NEXT_BUTTON,
        )
        .with_detail_outcomes(
            u1,
            vec![DetailOutcome::Timeout, DetailOutcome::Html(detail_page("da"))],
        )
        .with_detail_outcomes(u2, vec![DetailOutcome::TargetClosed]);

        let sink = CollectingSink::new();
        let report = run(script, &request(None, None), EnrichmentEngine::disabled(), &sink)
            .await
            .expect("the run completes without raising");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].detail_url, u1);
        assert_eq!(records[0].description, "da");
        assert_eq!(report.details_attempted, 2);
        assert_eq!(report.details_failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_postings_are_filtered() {
        let script = PageScript::paginated(
            vec![listing_page(
                &[
                    ("Fresh", "/job/1", "Posted 2 days ago"),
                    ("Stale", "/job/2", "Posted 30+ days ago"),
                ],
                Some(false),
            )],
            workday::config::NEXT_BUTTON,
        )
        .with_detail("https://acme.wd1.myworkdayjobs.com/job/1", detail_page("da"))
        .with_detail("https://acme.wd1.myworkdayjobs.com/job/2", detail_page("db"));

        let sink = CollectingSink::new();
        let report = run(script, &request(None, None), EnrichmentEngine::disabled(), &sink)
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Fresh");
        assert_eq!(report.stale_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_detail_url_across_pages_first_wins() {
        let u1 = "https://acme.wd1.myworkdayjobs.com/job/1";
        let u2 = "https://acme.wd1.myworkdayjobs.com/job/2";
        let script = PageScript::paginated(
            vec![
                listing_page(&[("A", "/job/1", "Posted Today")], Some(true)),
                listing_page(
                    &[("A", "/job/1", "Posted Today"), ("B", "/job/2", "Posted Today")],
                    Some(false),
                ),
            ],
            workday::config::NEXT_BUTTON,
        )
        .with_detail(u1, detail_page("da"))
        .with_detail(u2, detail_page("db"));

        let sink = CollectingSink::new();
        let report = run(script, &request(None, None), EnrichmentEngine::disabled(), &sink)
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(
            records.iter().map(|r| r.detail_url.as_str()).collect::<Vec<_>>(),
            vec![u1, u2]
        );
        assert_eq!(report.duplicates_dropped, 1);

        // Every emitted detail_url appears exactly once.
        let mut urls: Vec<&str> = records.iter().map(|r| r.detail_url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), records.len());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_enrichment_runs_without_remote_calls() {
        let config = rolescout_shared::OpenRouterConfig {
            enabled: true,
            api_key_env: "RS_TEST_NO_SUCH_KEY_7191".into(),
            default_model: "test-model".into(),
        };
        let engine = EnrichmentEngine::from_config(&config);

        let script = PageScript::paginated(
            vec![listing_page(&[("A", "/job/1", "Posted Today")], Some(false))],
            workday::config::NEXT_BUTTON,
        )
        .with_detail("https://acme.wd1.myworkdayjobs.com/job/1", detail_page("da"));

        let sink = CollectingSink::new();
        let report = run(script, &request(None, None), engine, &sink).await.unwrap();

        assert_eq!(report.enrichment_state, EnrichmentState::Disabled);
        assert_eq!(report.enrichment_batch_calls, 0);
        let records = sink.records();
        assert_eq!(records[0].location_parsed, "London, UK");
        assert!(records[0].location_parsed_intelligent.is_none());
    }

    // -- boundaries -------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn max_pages_zero_yields_no_work() {
        let script = PageScript::paginated(
            vec![listing_page(&[("A", "/job/1", "Posted Today")], Some(true))],
            workday::config::NEXT_BUTTON,
        );
        let browser = Arc::new(ScriptedBrowser::new(script));

        let sink = CollectingSink::new();
        let report = run_scrape(
            &request(Some(0), None),
            &AppConfig::default(),
            &PlatformRegistry::builtin(),
            browser.clone(),
            EnrichmentEngine::disabled(),
            &sink,
            &SilentProgress,
            &CancelSignal::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.summaries_found, 0);
        assert_eq!(report.records_emitted, 0);
        // Only the listing page was ever opened, and it was closed.
        assert_eq!(browser.pages_opened(), 1);
        assert_eq!(browser.pages_closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_fetches_produce_identical_output() {
        let script = || {
            PageScript::paginated(
                vec![listing_page(
                    &[
                        ("A", "/job/1", "Posted Today"),
                        ("B", "/job/2", "Posted Today"),
                        ("C", "/job/3", "Posted Today"),
                    ],
                    Some(false),
                )],
                workday::config::NEXT_BUTTON,
            )
            .with_detail("https://acme.wd1.myworkdayjobs.com/job/1", detail_page("da"))
            .with_detail("https://acme.wd1.myworkdayjobs.com/job/2", detail_page("db"))
            .with_detail("https://acme.wd1.myworkdayjobs.com/job/3", detail_page("dc"))
        };

        let wide_sink = CollectingSink::new();
        run(script(), &request(None, None), EnrichmentEngine::disabled(), &wide_sink)
            .await
            .unwrap();

        let serial_sink = CollectingSink::new();
        run(script(), &request(None, Some(1)), EnrichmentEngine::disabled(), &serial_sink)
            .await
            .unwrap();

        assert_eq!(wide_sink.records(), serial_sink.records());
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failure_surfaces_to_the_caller() {
        let script = PageScript::paginated(
            vec![listing_page(&[("A", "/job/1", "Posted Today")], Some(false))],
            workday::config::NEXT_BUTTON,
        )
        .with_detail("https://acme.wd1.myworkdayjobs.com/job/1", detail_page("da"));

        let sink = CollectingSink::failing();
        let err = run(script, &request(None, None), EnrichmentEngine::disabled(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, RoleScoutError::Sink(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn every_page_is_closed_even_with_failures() {
        let u1 = "https://acme.wd1.myworkdayjobs.com/job/1";
        let script = PageScript::paginated(
            vec![listing_page(&[("A", "/job/1", "Posted Today")], Some(false))],
            workday::config::NEXT_BUTTON,
        )
        .with_detail_outcomes(u1, vec![DetailOutcome::Error("flaky".into())]);
        let browser = Arc::new(ScriptedBrowser::new(script));

        let sink = CollectingSink::new();
        run_scrape(
            &request(None, None),
            &AppConfig::default(),
            &PlatformRegistry::builtin(),
            browser.clone(),
            EnrichmentEngine::disabled(),
            &sink,
            &SilentProgress,
            &CancelSignal::new(),
        )
        .await
        .unwrap();

        assert_eq!(browser.pages_opened(), browser.pages_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_fanout_closes_pages_and_skips_the_sink() {
        let u1 = "https://acme.wd1.myworkdayjobs.com/job/1";
        let u2 = "https://acme.wd1.myworkdayjobs.com/job/2";
        let script = PageScript::paginated(
            vec![listing_page(
                &[("A", "/job/1", "Posted Today"), ("B", "/job/2", "Posted Today")],
                Some(false),
            )],
            workday::config::NEXT_BUTTON,
        )
        .with_detail_outcomes(u1, vec![DetailOutcome::Hang])
        .with_detail_outcomes(u2, vec![DetailOutcome::Hang]);
        let browser = Arc::new(ScriptedBrowser::new(script));
        let cancel = CancelSignal::new();

        let sink = CollectingSink::new();
        let req = request(None, None);
        let app_config = AppConfig::default();
        let platform_registry = PlatformRegistry::builtin();
        let scrape = run_scrape(
            &req,
            &app_config,
            &platform_registry,
            browser.clone(),
            EnrichmentEngine::disabled(),
            &sink,
            &SilentProgress,
            &cancel,
        );
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::join!(scrape, trigger);

        assert!(matches!(result.unwrap_err(), RoleScoutError::Cancelled));
        assert_eq!(sink.persist_calls(), 0, "a cancelled run never reaches the sink");
        // Listing page plus both hung detail pages were all closed.
        assert_eq!(browser.pages_opened(), 3);
        assert_eq!(browser.pages_closed(), 3);
    }
}
