//! Compose-and-publish page. Gated on holding a credential.
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::PageContext;
use crate::model::{Draft, DraftError};
use crate::shell::routes::Route;

pub const CREATE_FAILED: &str = "Failed to create blog. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Published; the draft is gone and the feed is showing.
    Published { id: i64 },
    /// A required field was empty. Nothing was sent.
    Invalid(DraftError),
    /// No credential: sent to the login page without calling the API.
    LoginRequired,
    /// The API refused; the message is on the page and the draft is kept.
    Failed(String),
    /// An earlier submit is still waiting on the API; nothing was sent.
    Busy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateState {
    pub draft: Draft,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Debug)]
pub struct CreateArticleViewModel {
    ctx: PageContext,
    state: Mutex<CreateState>,
}

impl CreateArticleViewModel {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(CreateState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CreateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> CreateState {
        self.state().clone()
    }

    /// Route guard run when the page mounts. Returns `false` after redirecting
    /// to the login page.
    pub fn on_mount(&self) -> bool {
        if self.ctx.session.is_authenticated() {
            return true;
        }
        info!("create page opened without a credential; redirecting to login");
        self.ctx.navigator.redirect(Route::Login);
        false
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().draft.title = title.into();
    }

    pub fn set_body(&self, body: impl Into<String>) {
        self.state().draft.body = body.into();
    }

    /// Abandon the draft and go back to the feed.
    pub fn cancel(&self) {
        *self.state() = CreateState::default();
        self.ctx.navigator.navigate(Route::Feed);
    }

    #[instrument(skip_all)]
    pub async fn submit(&self) -> SubmitOutcome {
        let draft = {
            let mut state = self.state();
            if state.submitting {
                debug!("submit already in flight");
                return SubmitOutcome::Busy;
            }
            if let Err(invalid) = state.draft.validate() {
                state.error = Some(invalid.to_string());
                return SubmitOutcome::Invalid(invalid);
            }
            state.error = None;
            state.submitting = true;
            state.draft.clone()
        };

        let Some(credential) = self.ctx.session.credential() else {
            self.state().submitting = false;
            info!("submit without a credential; redirecting to login");
            self.ctx.navigator.redirect(Route::Login);
            return SubmitOutcome::LoginRequired;
        };

        let result = self.ctx.api.create_article(Some(&credential), &draft).await;
        self.state().submitting = false;

        match result {
            Ok(article) => {
                info!(id = article.id, "article published");
                *self.state() = CreateState::default();
                self.ctx.navigator.navigate(Route::Feed);
                SubmitOutcome::Published { id: article.id }
            }
            Err(err) => {
                warn!(?err, "failed to publish article");
                let message = err.detail().unwrap_or(CREATE_FAILED).to_string();
                self.state().error = Some(message.clone());
                self.ctx.reject_if_unauthorized(&err).await;
                SubmitOutcome::Failed(message)
            }
        }
    }
}
