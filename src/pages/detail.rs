use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{instrument, warn};

use super::PageContext;
use crate::model::ArticleDetail;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetailError {
    #[error("Article not found.")]
    NotFound,
    #[error("Failed to load the article.")]
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailState {
    pub article: Option<ArticleDetail>,
    pub error: Option<DetailError>,
    pub loading: bool,
}

/// A single article. Nothing is cached: every mount fetches again.
#[derive(Debug)]
pub struct DetailViewModel {
    ctx: PageContext,
    state: Mutex<DetailState>,
}

impl DetailViewModel {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(DetailState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> DetailState {
        self.state().clone()
    }

    #[instrument(skip(self))]
    pub async fn load(&self, id: i64) -> Result<(), DetailError> {
        self.state().loading = true;
        let bearer = self.ctx.session.credential();
        let result = self.ctx.api.get_article(bearer.as_deref(), id).await;

        let err = match result {
            Ok(article) => {
                let mut state = self.state();
                state.article = Some(article);
                state.error = None;
                state.loading = false;
                return Ok(());
            }
            Err(err) => err,
        };

        warn!(?err, id, "failed to load article");
        let kind = if err.is_not_found() {
            DetailError::NotFound
        } else {
            DetailError::Failed
        };
        {
            let mut state = self.state();
            state.error = Some(kind.clone());
            state.loading = false;
        }
        self.ctx.reject_if_unauthorized(&err).await;
        Err(kind)
    }
}
