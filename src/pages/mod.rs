//! Page view-models: each owns the data it fetched plus loading/error flags.
use std::sync::Arc;
use tracing::warn;

use crate::api::{ApiError, BlogApi};
use crate::session::SessionStore;
use crate::shell::navigator::Navigator;
use crate::shell::routes::Route;

pub mod create;
pub mod detail;
pub mod list;
pub mod login;
pub mod pagination;

pub use create::{CreateArticleViewModel, SubmitOutcome};
pub use detail::{DetailError, DetailViewModel};
pub use list::{ListViewModel, LoadOutcome};
pub use login::{LoginOutcome, LoginViewModel};
pub use pagination::{page_window, PageItem};

/// Collaborators every page receives from the shell.
#[derive(Clone)]
pub struct PageContext {
    pub api: Arc<dyn BlogApi>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("session", &self.session)
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}

impl PageContext {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>, navigator: Arc<Navigator>) -> Self {
        Self {
            api,
            session,
            navigator,
        }
    }

    /// A 401 means the credential is dead: sign out and send the user to the
    /// login page. Returns whether that happened.
    pub async fn reject_if_unauthorized(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        warn!("api rejected the session credential; signing out");
        self.session.logout().await;
        self.navigator.redirect(Route::Login);
        true
    }
}
