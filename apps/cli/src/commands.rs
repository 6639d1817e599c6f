//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use rolescout_browser::{CdpBrowser, LaunchOptions};
use rolescout_core::pipeline::{ProgressReporter, RunReport};
use rolescout_core::{CancelSignal, CsvSink, RecordSink, StorageSink};
use rolescout_enrich::EnrichmentEngine;
use rolescout_platforms::PlatformRegistry;
use rolescout_shared::{AppConfig, RunRequest, init_config, load_config};
use rolescout_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// RoleScout — aggregate finance job postings from employer career sites.
#[derive(Parser)]
#[command(
    name = "rolescout",
    version,
    about = "Scrape employer career boards into normalized job listings.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape one employer's career board.
    Scrape {
        /// Employer name stamped onto every record.
        #[arg(long)]
        company: String,

        /// Listing index URL.
        #[arg(long)]
        url: String,

        /// Platform identifier (see `rolescout platforms`).
        #[arg(long)]
        platform: String,

        /// Cap on listing pages.
        #[arg(long)]
        max_pages: Option<u32>,

        /// Concurrent detail fetches (overrides platform and config defaults).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Append records to this CSV file instead of the database.
        #[arg(long)]
        csv: Option<String>,

        /// Listings database path (default: ./var/rolescout.db).
        #[arg(long)]
        db: Option<String>,

        /// Skip location enrichment for this run.
        #[arg(long)]
        no_enrich: bool,

        /// Run the browser with a visible window.
        #[arg(long)]
        headful: bool,
    },

    /// List registered platform identifiers.
    Platforms,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rolescout=info",
        1 => "rolescout=debug",
        _ => "rolescout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape {
            company,
            url,
            platform,
            max_pages,
            concurrency,
            csv,
            db,
            no_enrich,
            headful,
        } => {
            cmd_scrape(ScrapeArgs {
                company,
                url,
                platform,
                max_pages,
                concurrency,
                csv,
                db,
                no_enrich,
                headful,
            })
            .await
        }
        Command::Platforms => cmd_platforms(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

struct ScrapeArgs {
    company: String,
    url: String,
    platform: String,
    max_pages: Option<u32>,
    concurrency: Option<usize>,
    csv: Option<String>,
    db: Option<String>,
    no_enrich: bool,
    headful: bool,
}

async fn cmd_scrape(args: ScrapeArgs) -> Result<()> {
    let mut config = load_config()?;
    if args.no_enrich {
        config.openrouter.enabled = false;
    }

    let target_url =
        Url::parse(&args.url).map_err(|e| eyre!("invalid URL '{}': {e}", args.url))?;

    let request = RunRequest {
        company_name: args.company.clone(),
        target_url,
        platform: args.platform.clone(),
        max_pages: args.max_pages.or(config.defaults.max_pages),
        job_detail_concurrency: args.concurrency,
    };
    request.validate()?;

    let registry = PlatformRegistry::builtin();
    let enrichment = EnrichmentEngine::from_config(&config.openrouter);

    info!(
        company = %args.company,
        platform = %args.platform,
        url = %args.url,
        "starting scrape"
    );

    let reporter = CliProgress::new();

    // Ctrl-C cancels the run; in-flight tasks close their pages and no
    // output is persisted.
    let cancel = CancelSignal::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let browser = CdpBrowser::launch(&LaunchOptions {
        headless: !args.headful,
    })
    .await?;
    let browser: Arc<CdpBrowser> = Arc::new(browser);

    // Exactly one sink per run: CSV when requested, the database otherwise.
    let report = if let Some(csv_path) = &args.csv {
        let sink = CsvSink::new(csv_path);
        run_with_sink(
            &request,
            &config,
            &registry,
            browser.clone(),
            enrichment,
            &sink,
            &reporter,
            &cancel,
        )
        .await
    } else {
        let db_path = args
            .db
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("var").join("rolescout.db"));
        let storage = Storage::open(&db_path).await?;
        let sink = StorageSink::new(storage);
        let report = run_with_sink(
            &request,
            &config,
            &registry,
            browser.clone(),
            enrichment,
            &sink,
            &reporter,
            &cancel,
        )
        .await;
        if let Ok(report) = &report {
            sink.storage()
                .insert_run(
                    &report.run_id,
                    &request.company_name,
                    &request.platform,
                    request.target_url.as_str(),
                )
                .await?;
            sink.storage()
                .finish_run(&report.run_id, &report.stats_json().to_string())
                .await?;
        }
        report
    };

    match Arc::try_unwrap(browser) {
        Ok(browser) => browser.shutdown().await,
        Err(_) => tracing::warn!("browser still referenced, skipping shutdown"),
    }

    let report = report?;

    // Print summary
    println!();
    println!("  Scrape complete!");
    println!("  Run:        {}", report.run_id);
    println!("  Company:    {}", report.company_name);
    println!("  Platform:   {}", report.platform);
    println!("  Summaries:  {}", report.summaries_found);
    println!("  Emitted:    {}", report.records_emitted);
    println!("  Failed:     {}", report.details_failed);
    println!(
        "  Dropped:    {} duplicate, {} stale",
        report.duplicates_dropped, report.stale_dropped
    );
    println!(
        "  Enrichment: {} ({} batch call{})",
        report.enrichment_state,
        report.enrichment_batch_calls,
        if report.enrichment_batch_calls == 1 { "" } else { "s" }
    );
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn run_with_sink(
    request: &RunRequest,
    config: &AppConfig,
    registry: &PlatformRegistry,
    browser: Arc<CdpBrowser>,
    enrichment: EnrichmentEngine,
    sink: &dyn RecordSink,
    reporter: &CliProgress,
    cancel: &CancelSignal,
) -> Result<RunReport, rolescout_shared::RoleScoutError> {
    rolescout_core::run_scrape(
        request, config, registry, browser, enrichment, sink, reporter, cancel,
    )
    .await
}

fn cmd_platforms() -> Result<()> {
    let registry = PlatformRegistry::builtin();
    for identifier in registry.supported_platforms() {
        println!("{identifier}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail_fetched(&self, current: usize, total: usize, url: &str) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
