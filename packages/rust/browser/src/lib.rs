//! Headless-browser seam for RoleScout.
//!
//! The crawl engine never talks to a browser library directly; it drives the
//! [`BrowserHandle`] and [`DrivenPage`] capability traits. The production
//! implementation ([`driver::CdpBrowser`]) is backed by chromiumoxide; the
//! [`testing`] module provides scripted in-memory doubles for tests.

pub mod driver;
pub mod paging;
pub mod testing;

use std::time::Duration;

use async_trait::async_trait;

use rolescout_shared::Result;

pub use driver::{CdpBrowser, LaunchOptions};
pub use paging::{ScrollBudget, click_next, count_matches, has_pagination, scroll_to_load};

/// Navigation readiness the caller wants before `goto` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavWait {
    /// DOM content loaded — enough for detail pages.
    DomContentLoaded,
    /// Network quiet — used for the initial listing navigation.
    NetworkIdle,
}

/// One browsing page the crawl engine can drive.
///
/// Every method is cancel-safe; [`close`](DrivenPage::close) must be called
/// on every exit path by whoever owns the page.
#[async_trait]
pub trait DrivenPage: Send + Sync {
    /// Navigate to `url` and wait for the requested readiness, bounded by
    /// `budget`. Timing out yields a `NavigationTimeout`; a lost target
    /// yields `TargetClosed`.
    async fn goto(&self, url: &str, wait: NavWait, budget: Duration) -> Result<()>;

    /// Wait until `selector` matches at least one element, bounded by `budget`.
    async fn wait_for(&self, selector: &str, budget: Duration) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Scroll the document to its end (triggers lazy loading).
    async fn scroll_to_end(&self) -> Result<()>;

    /// Snapshot of the current DOM as HTML.
    async fn content(&self) -> Result<String>;

    /// The page's `<title>` text, or an empty string.
    async fn page_title(&self) -> Result<String>;

    /// Release the page and its underlying browsing context.
    async fn close(&self) -> Result<()>;
}

/// A live browser that hands out isolated pages.
///
/// The orchestrator owns one handle per run and gives each detail task its
/// own page; page allocation is safe from concurrent tasks.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    /// Open a fresh page in its own browsing context.
    async fn new_page(&self) -> Result<Box<dyn DrivenPage>>;
}

/// Owns a page for one unit of work and guarantees it is closed on every
/// exit path, including cancellation.
///
/// The normal path is an explicit [`close`](PageGuard::close). If the owning
/// future is dropped mid-flight instead, the guard spawns the close so the
/// browsing context cannot leak.
pub struct PageGuard {
    page: Option<Box<dyn DrivenPage>>,
}

impl PageGuard {
    pub fn new(page: Box<dyn DrivenPage>) -> Self {
        Self { page: Some(page) }
    }

    /// The guarded page. Present until [`close`](PageGuard::close) consumes
    /// the guard.
    pub fn page(&self) -> &dyn DrivenPage {
        self.page.as_deref().expect("page present until close")
    }

    /// Close the page and disarm the guard.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close failed");
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::debug!(error = %e, "page close failed after drop");
                }
            });
        }
    }
}

/// Navigate a listing page, tolerating a navigation timeout.
///
/// The later container wait is authoritative, so a page that is still
/// settling is returned as-is; only non-timeout failures propagate.
pub async fn navigate_lenient(page: &dyn DrivenPage, url: &str, budget: Duration) -> Result<()> {
    match page.goto(url, NavWait::NetworkIdle, budget).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_timeout() => {
            tracing::warn!(url, error = %e, "listing navigation timed out, continuing");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
