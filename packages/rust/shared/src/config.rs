//! Application configuration for RoleScout.
//!
//! User config lives at `~/.rolescout/rolescout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, RoleScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "rolescout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".rolescout";

// ---------------------------------------------------------------------------
// Config structs (matching rolescout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter enrichment settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Timeout budgets for browser-driven operations.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default bound on concurrent detail-page fetches.
    #[serde(default = "default_job_detail_concurrency")]
    pub job_detail_concurrency: usize,

    /// Default cap on listing pages per run (unset = crawl to the end).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Whether to run the browser headless.
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            job_detail_concurrency: default_job_detail_concurrency(),
            max_pages: None,
            headless: true,
        }
    }
}

fn default_job_detail_concurrency() -> usize {
    10
}
fn default_true() -> bool {
    true
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Feature flag for location enrichment.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default model to use for location enrichment.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_api_key_env(),
            default_model: default_model(),
        }
    }
}

impl OpenRouterConfig {
    /// Resolve the API key from the configured env var, if set and non-empty.
    pub fn resolve_api_key(&self) -> Option<String> {
        match std::env::var(&self.api_key_env) {
            Ok(val) if !val.is_empty() => Some(val),
            _ => None,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}

/// `[timeouts]` section — budgets for browser-driven operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Detail-page navigation ceiling, in seconds.
    #[serde(default = "default_navigation_secs")]
    pub navigation_secs: u64,

    /// Listing-page initial navigation budget, in seconds.
    #[serde(default = "default_listing_nav_secs")]
    pub listing_nav_secs: u64,

    /// Budget for required-selector waits, in seconds.
    #[serde(default = "default_selector_wait_secs")]
    pub selector_wait_secs: u64,

    /// Budget for the pagination-presence probe, in seconds.
    #[serde(default = "default_pagination_probe_secs")]
    pub pagination_probe_secs: u64,

    /// Delay between listing pages, in milliseconds.
    #[serde(default = "default_inter_page_delay_ms")]
    pub inter_page_delay_ms: u64,

    /// Settle time after each scroll step, in milliseconds.
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Hard cap on scroll attempts.
    #[serde(default = "default_scroll_max_attempts")]
    pub scroll_max_attempts: u32,

    /// Consecutive no-progress scrolls that end the loop.
    #[serde(default = "default_scroll_no_progress_limit")]
    pub scroll_no_progress_limit: u32,

    /// Base backoff between detail retry attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            navigation_secs: default_navigation_secs(),
            listing_nav_secs: default_listing_nav_secs(),
            selector_wait_secs: default_selector_wait_secs(),
            pagination_probe_secs: default_pagination_probe_secs(),
            inter_page_delay_ms: default_inter_page_delay_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            scroll_max_attempts: default_scroll_max_attempts(),
            scroll_no_progress_limit: default_scroll_no_progress_limit(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_navigation_secs() -> u64 {
    60
}
fn default_listing_nav_secs() -> u64 {
    20
}
fn default_selector_wait_secs() -> u64 {
    10
}
fn default_pagination_probe_secs() -> u64 {
    5
}
fn default_inter_page_delay_ms() -> u64 {
    2_000
}
fn default_scroll_settle_ms() -> u64 {
    1_000
}
fn default_scroll_max_attempts() -> u32 {
    20
}
fn default_scroll_no_progress_limit() -> u32 {
    5
}
fn default_retry_backoff_ms() -> u64 {
    2_000
}

// ---------------------------------------------------------------------------
// Run request (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Run-level inputs for one scrape: the `(company, target_url, platform)`
/// triple plus optional overrides of the merged defaults.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Employer name stamped onto every record of the run.
    pub company_name: String,
    /// Absolute URL of the listing index.
    pub target_url: Url,
    /// Registered platform identifier (e.g. `workday`).
    pub platform: String,
    /// Cap on listing pages; `Some(0)` yields an empty run.
    pub max_pages: Option<u32>,
    /// Override of the merged `job_detail_concurrency`.
    pub job_detail_concurrency: Option<usize>,
}

impl RunRequest {
    /// Validate required run inputs. Failures are fatal for the run.
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(RoleScoutError::config("company_name must not be empty"));
        }
        if self.platform.trim().is_empty() {
            return Err(RoleScoutError::config("platform must not be empty"));
        }
        match self.target_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RoleScoutError::config(format!(
                    "target_url must be http(s), got scheme '{other}'"
                )));
            }
        }
        if self.job_detail_concurrency == Some(0) {
            return Err(RoleScoutError::config(
                "job_detail_concurrency must be a positive integer",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.rolescout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RoleScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.rolescout/rolescout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RoleScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| RoleScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RoleScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RoleScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RoleScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
