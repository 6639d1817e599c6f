//! Scripted in-memory doubles for the browser seam.
//!
//! [`ScriptedPage`] serves canned HTML snapshots and failure scripts through
//! the [`DrivenPage`] contract, so crawler and orchestrator behavior is
//! testable without Chromium. [`ScriptedBrowser`] hands out pages over a
//! shared script and counts open/close calls for leak assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use rolescout_shared::{Result, RoleScoutError};

use crate::paging::count_matches;
use crate::{BrowserHandle, DrivenPage, NavWait};

/// One scripted response to a detail-page navigation.
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    /// Navigation succeeds and the page shows this HTML.
    Html(String),
    /// Navigation times out.
    Timeout,
    /// The browsing target is lost.
    TargetClosed,
    /// A generic transport failure.
    Error(String),
    /// Navigation parks forever; used to hold a task open for
    /// cancellation tests.
    Hang,
}

/// Canned behavior shared by every page of a [`ScriptedBrowser`].
///
/// Detail outcomes are consumed in order per URL; the last outcome repeats,
/// so `[Timeout, Html(..)]` models "fails once, then succeeds".
pub struct PageScript {
    listing_pages: Vec<String>,
    scroll_states: Vec<String>,
    next_selector: String,
    details: Mutex<HashMap<String, VecDeque<DetailOutcome>>>,
}

impl PageScript {
    /// A numbered-pagination board: one snapshot per listing page, advanced
    /// by clicking `next_selector`.
    pub fn paginated(pages: Vec<String>, next_selector: impl Into<String>) -> Self {
        Self {
            listing_pages: pages,
            scroll_states: Vec::new(),
            next_selector: next_selector.into(),
            details: Mutex::new(HashMap::new()),
        }
    }

    /// An infinite-scroll board: the first state is the initial render, each
    /// scroll advances to the next state, the last state repeats.
    pub fn scrolling(states: Vec<String>) -> Self {
        Self {
            listing_pages: Vec::new(),
            scroll_states: states,
            next_selector: String::new(),
            details: Mutex::new(HashMap::new()),
        }
    }

    /// Script a detail page that always renders `html`.
    pub fn with_detail(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_detail_outcomes(url, vec![DetailOutcome::Html(html.into())])
    }

    /// Script a sequence of outcomes for one detail URL.
    pub fn with_detail_outcomes(self, url: impl Into<String>, outcomes: Vec<DetailOutcome>) -> Self {
        self.details
            .lock()
            .expect("script lock")
            .insert(url.into(), outcomes.into());
        self
    }

    fn initial_html(&self) -> String {
        self.listing_pages
            .first()
            .or_else(|| self.scroll_states.first())
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string())
    }

    fn detail_response(&self, url: &str) -> Option<DetailOutcome> {
        let mut details = self.details.lock().expect("script lock");
        let queue = details.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedPage
// ---------------------------------------------------------------------------

struct PageState {
    current: String,
    listing_index: usize,
    scroll_index: usize,
}

/// A [`DrivenPage`] over a [`PageScript`].
pub struct ScriptedPage {
    script: Arc<PageScript>,
    state: Mutex<PageState>,
    scrolls: AtomicUsize,
    closed_counter: Option<Arc<AtomicUsize>>,
}

impl ScriptedPage {
    pub fn new(script: PageScript) -> Self {
        Self::over(Arc::new(script), None)
    }

    fn over(script: Arc<PageScript>, closed_counter: Option<Arc<AtomicUsize>>) -> Self {
        let current = script.initial_html();
        Self {
            script,
            state: Mutex::new(PageState {
                current,
                listing_index: 0,
                scroll_index: 1,
            }),
            scrolls: AtomicUsize::new(0),
            closed_counter,
        }
    }

    /// How many scroll steps this page performed.
    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DrivenPage for ScriptedPage {
    async fn goto(&self, url: &str, _wait: NavWait, budget: Duration) -> Result<()> {
        if let Some(outcome) = self.script.detail_response(url) {
            return match outcome {
                DetailOutcome::Html(html) => {
                    self.state.lock().expect("page state").current = html;
                    Ok(())
                }
                DetailOutcome::Timeout => Err(RoleScoutError::timeout(url, budget)),
                DetailOutcome::TargetClosed => {
                    Err(RoleScoutError::TargetClosed(format!("{url}: scripted")))
                }
                DetailOutcome::Error(msg) => Err(RoleScoutError::Browser(msg)),
                DetailOutcome::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            };
        }

        // Anything unscripted is treated as the listing index.
        let mut state = self.state.lock().expect("page state");
        state.listing_index = 0;
        state.scroll_index = 1;
        state.current = self.script.initial_html();
        Ok(())
    }

    async fn wait_for(&self, selector: &str, budget: Duration) -> Result<()> {
        let current = self.state.lock().expect("page state").current.clone();
        if count_matches(&current, selector) > 0 {
            Ok(())
        } else {
            Err(RoleScoutError::timeout(selector, budget))
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().expect("page state");
        if selector == self.script.next_selector
            && state.listing_index + 1 < self.script.listing_pages.len()
        {
            state.listing_index += 1;
            state.current = self.script.listing_pages[state.listing_index].clone();
        }
        Ok(())
    }

    async fn scroll_to_end(&self) -> Result<()> {
        self.scrolls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().expect("page state");
        if state.scroll_index < self.script.scroll_states.len() {
            state.current = self.script.scroll_states[state.scroll_index].clone();
            state.scroll_index += 1;
        }
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.state.lock().expect("page state").current.clone())
    }

    async fn page_title(&self) -> Result<String> {
        let current = self.state.lock().expect("page state").current.clone();
        Ok(extract_title(&current))
    }

    async fn close(&self) -> Result<()> {
        if let Some(counter) = &self.closed_counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

fn extract_title(html: &str) -> String {
    let sel = Selector::parse("title").expect("title selector");
    Html::parse_document(html)
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ScriptedBrowser
// ---------------------------------------------------------------------------

/// A [`BrowserHandle`] whose pages all follow one shared script.
pub struct ScriptedBrowser {
    script: Arc<PageScript>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl ScriptedBrowser {
    pub fn new(script: PageScript) -> Self {
        Self {
            script: Arc::new(script),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many pages were handed out.
    pub fn pages_opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// How many pages were closed.
    pub fn pages_closed(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BrowserHandle for ScriptedBrowser {
    async fn new_page(&self) -> Result<Box<dyn DrivenPage>> {
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ScriptedPage::over(
            self.script.clone(),
            Some(self.closed.clone()),
        )))
    }
}
