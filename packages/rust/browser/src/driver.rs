//! chromiumoxide-backed implementation of the browser seam.
//!
//! Launches a headless Chromium with scrape-optimized settings: realistic
//! desktop user agent, browser-like request headers, and image/stylesheet/
//! font requests blocked at the network layer.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::SetBypassCspParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use rolescout_shared::{Result, RoleScoutError};

use crate::{BrowserHandle, DrivenPage, NavWait};

/// Desktop user agent presented to career boards.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Request patterns aborted before they hit the network.
const BLOCKED_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.css", "*.woff", "*.woff2",
    "*.ttf",
];

/// Chromium flags tuned for scraping.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-background-networking",
    "--no-first-run",
    "--blink-settings=imagesEnabled=false",
];

/// Interval between selector-presence polls.
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Settle time after load when network-idle readiness was requested.
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { headless: true }
    }
}

// ---------------------------------------------------------------------------
// CdpBrowser
// ---------------------------------------------------------------------------

/// A launched Chromium instance driving pages over CDP.
pub struct CdpBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch a browser with scrape-optimized settings.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder().args(LAUNCH_ARGS.iter().copied());
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RoleScoutError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RoleScoutError::Browser(format!("launch failed: {e}")))?;

        // Drive the CDP event stream for the life of the browser.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        debug!(headless = options.headless, "browser launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Close the browser and stop the CDP event loop.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        self.handler_task.abort();
    }
}

#[async_trait]
impl BrowserHandle for CdpBrowser {
    async fn new_page(&self) -> Result<Box<dyn DrivenPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| page_error(e, "new page"))?;
        prepare_page(&page).await?;
        Ok(Box::new(CdpPage { page }))
    }
}

/// Apply per-page scrape settings: user agent, header overrides, and
/// resource blocking.
async fn prepare_page(page: &Page) -> Result<()> {
    page.set_user_agent(USER_AGENT)
        .await
        .map_err(|e| page_error(e, "set user agent"))?;

    page.execute(SetBlockedUrLsParams {
        urls: BLOCKED_PATTERNS.iter().map(|p| p.to_string()).collect(),
    })
    .await
    .map_err(|e| page_error(e, "block resource patterns"))?;

    page.execute(SetExtraHttpHeadersParams {
        headers: Headers::new(serde_json::json!({
            "Accept-Language": "en-US,en;q=0.9",
            "Upgrade-Insecure-Requests": "1",
        })),
    })
    .await
    .map_err(|e| page_error(e, "set extra headers"))?;

    // Career boards ship CSPs that break injected scroll/query scripts.
    page.execute(SetBypassCspParams { enabled: true })
        .await
        .map_err(|e| page_error(e, "bypass csp"))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// CdpPage
// ---------------------------------------------------------------------------

struct CdpPage {
    page: Page,
}

#[async_trait]
impl DrivenPage for CdpPage {
    async fn goto(&self, url: &str, wait: NavWait, budget: Duration) -> Result<()> {
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| page_error(e, url))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| page_error(e, url))?;
            Ok::<(), RoleScoutError>(())
        };

        match tokio::time::timeout(budget, navigation).await {
            Ok(result) => result?,
            Err(_) => return Err(RoleScoutError::timeout(url, budget)),
        }

        if wait == NavWait::NetworkIdle {
            // Approximation; the caller's container wait is authoritative.
            tokio::time::sleep(NETWORK_IDLE_SETTLE).await;
        }
        Ok(())
    }

    async fn wait_for(&self, selector: &str, budget: Duration) -> Result<()> {
        let deadline = Instant::now() + budget;
        loop {
            match self.page.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(e) if is_target_lost(&e) => {
                    return Err(RoleScoutError::TargetClosed(e.to_string()));
                }
                Err(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(RoleScoutError::timeout(selector, budget));
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| page_error(e, selector))?;
        element.click().await.map_err(|e| page_error(e, selector))?;
        Ok(())
    }

    async fn scroll_to_end(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| page_error(e, "scroll"))?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| page_error(e, "content"))
    }

    async fn page_title(&self) -> Result<String> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| page_error(e, "title"))?;
        Ok(title.unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| page_error(e, "close"))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Whether a protocol error means the browsing target is gone for good.
fn is_target_lost(err: &impl std::fmt::Display) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("target closed")
        || msg.contains("session closed")
        || msg.contains("browser closed")
        || msg.contains("target detached")
        || msg.contains("session not found")
        || msg.contains("connection closed")
}

/// Map a protocol error onto the run's error taxonomy.
fn page_error(err: impl std::fmt::Display, what: &str) -> RoleScoutError {
    if is_target_lost(&err) {
        RoleScoutError::TargetClosed(format!("{what}: {err}"))
    } else {
        RoleScoutError::Browser(format!("{what}: {err}"))
    }
}
