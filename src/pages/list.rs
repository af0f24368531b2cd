//! The paged article feed.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::pagination::{page_window, PageItem};
use super::PageContext;
use crate::api::PAGE_SIZE;
use crate::model::{ArticleSummary, PageWindow};

pub const LOAD_FAILED: &str = "Failed to connect to the TechEndeavor API.";

/// What happened to one `load_page` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A later request was issued while this one was in flight; its result was dropped.
    Stale,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub articles: Vec<ArticleSummary>,
    pub window: PageWindow,
    /// Page most recently asked for; may run ahead of `window` while loading.
    pub requested_page: u32,
    pub error: Option<String>,
    pub loading: bool,
    pub loaded_once: bool,
}

impl ListState {
    /// Full-page spinner: only before anything has ever arrived.
    pub fn show_full_spinner(&self) -> bool {
        self.loading && !self.loaded_once
    }

    pub fn is_empty_feed(&self) -> bool {
        self.loaded_once && self.articles.is_empty() && self.error.is_none()
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        page_window(self.window.current_page(), self.window.total_pages())
    }

    /// Pagination controls are hidden for single-page feeds.
    pub fn shows_pagination(&self) -> bool {
        self.window.total_pages() > 1
    }
}

#[derive(Debug)]
pub struct ListViewModel {
    ctx: PageContext,
    state: Mutex<ListState>,
    generation: AtomicU64,
}

impl ListViewModel {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(ListState {
                requested_page: 1,
                loading: true,
                ..ListState::default()
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ListState {
        self.state().clone()
    }

    pub fn window(&self) -> PageWindow {
        self.state().window
    }

    /// Fetch page `page`. Only the most recently issued load may touch the
    /// held articles; earlier ones resolving later are discarded.
    #[instrument(skip(self))]
    pub async fn load_page(&self, page: u32) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state();
            state.requested_page = page;
            state.loading = true;
        }

        let bearer = self.ctx.session.credential();
        let result = self
            .ctx
            .api
            .list_articles(bearer.as_deref(), page, PAGE_SIZE)
            .await;

        let (outcome, err) = {
            let mut state = self.state();
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(page, generation, "discarding stale page response");
                (LoadOutcome::Stale, result.err())
            } else {
                state.loading = false;
                match result {
                    Ok(fetched) => {
                        state.window = PageWindow::new(fetched.page, fetched.total_pages);
                        state.articles = fetched.items;
                        state.error = None;
                        state.loaded_once = true;
                        (LoadOutcome::Applied, None)
                    }
                    Err(err) => {
                        warn!(?err, page, "failed to load article page");
                        state.error = Some(LOAD_FAILED.to_string());
                        (LoadOutcome::Failed, Some(err))
                    }
                }
            }
        };
        // Stale or not, a rejected credential signs the user out.
        if let Some(err) = err {
            self.ctx.reject_if_unauthorized(&err).await;
        }
        outcome
    }

    /// Move to `page` if it exists; returns `None` for out-of-range pages.
    pub async fn go_to_page(&self, page: u32) -> Option<LoadOutcome> {
        if !self.window().contains(page) {
            debug!(page, "ignoring out-of-range page");
            return None;
        }
        self.ctx.navigator.request_scroll_to_top();
        Some(self.load_page(page).await)
    }

    pub async fn previous(&self) -> Option<LoadOutcome> {
        let window = self.window();
        if !window.has_previous() {
            return None;
        }
        self.go_to_page(window.current_page() - 1).await
    }

    pub async fn next(&self) -> Option<LoadOutcome> {
        let window = self.window();
        if !window.has_next() {
            return None;
        }
        self.go_to_page(window.current_page() + 1).await
    }
}
