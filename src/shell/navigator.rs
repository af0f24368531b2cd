use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::routes::Route;

#[derive(Debug)]
struct NavState {
    current: Route,
    history: Vec<Route>,
    scroll_requests: u64,
}

/// Tracks where the user is. Pages ask it to move; the shell reads it back
/// to decide what to mount next.
#[derive(Debug)]
pub struct Navigator {
    state: Mutex<NavState>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Feed)
    }
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            state: Mutex::new(NavState {
                current: initial.clone(),
                history: vec![initial],
                scroll_requests: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> Route {
        self.state().current.clone()
    }

    /// Routes visited so far, oldest first; redirects replace their origin.
    pub fn history(&self) -> Vec<Route> {
        self.state().history.clone()
    }

    /// Push a new entry, like following a link.
    pub fn navigate(&self, route: Route) {
        debug!(to = %route, "navigate");
        let mut state = self.state();
        state.history.push(route.clone());
        state.current = route;
    }

    /// Replace the current entry, so going back skips the page that bounced.
    pub fn redirect(&self, route: Route) {
        debug!(to = %route, "redirect");
        let mut state = self.state();
        match state.history.last_mut() {
            Some(last) => *last = route.clone(),
            None => state.history.push(route.clone()),
        }
        state.current = route;
    }

    pub fn request_scroll_to_top(&self) {
        self.state().scroll_requests += 1;
    }

    pub fn scroll_requests(&self) -> u64 {
        self.state().scroll_requests
    }
}
