//! Application shell: owns the session, maps routes to pages and keeps the
//! header in sync with the session.
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::db;
use crate::pages::{
    CreateArticleViewModel, DetailViewModel, ListViewModel, LoginViewModel, PageContext,
};
use crate::session::{SessionStore, SqliteCredentialStore};

pub mod header;
pub mod navigator;
pub mod overlay;
pub mod routes;

use header::Navbar;
use navigator::Navigator;
use overlay::PointerEvents;
use routes::Route;

/// Guards can bounce a page to another one; stop following after this many.
const MAX_REDIRECTS: usize = 4;

/// A mounted page.
#[derive(Debug)]
pub enum Page {
    Feed(ListViewModel),
    Article(DetailViewModel),
    CreateArticle(CreateArticleViewModel),
    Login(LoginViewModel),
    NotFound(String),
}

impl Page {
    pub fn route_name(&self) -> &'static str {
        match self {
            Page::Feed(_) => "feed",
            Page::Article(_) => "article",
            Page::CreateArticle(_) => "create-blog",
            Page::Login(_) => "login",
            Page::NotFound(_) => "not-found",
        }
    }
}

#[derive(Debug)]
pub struct App {
    ctx: PageContext,
    navbar: Navbar,
    events: PointerEvents,
}

impl App {
    /// Wire the real API client and the SQLite credential store from `cfg`,
    /// restoring any credential saved by an earlier run.
    #[instrument(skip_all)]
    pub async fn start(cfg: &Config) -> Result<Self> {
        cfg.ensure_dirs()?;
        let pool = db::init_pool(&cfg.database_url()).await?;
        db::run_migrations(&pool).await?;

        let storage = Arc::new(SqliteCredentialStore::new(pool, cfg.api.origin()?));
        let session = Arc::new(SessionStore::new(storage));
        if session.restore().await {
            info!("resuming stored session");
        }

        let api = Arc::new(ApiClient::from_config(cfg)?);
        let ctx = PageContext::new(api, session, Arc::new(Navigator::default()));
        Ok(Self::new(ctx))
    }

    pub fn new(ctx: PageContext) -> Self {
        let events = PointerEvents::new();
        let navbar = Navbar::mount(ctx.clone(), &events);
        Self {
            ctx,
            navbar,
            events,
        }
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.ctx.session
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.ctx.navigator
    }

    pub fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    pub fn pointer_events(&self) -> &PointerEvents {
        &self.events
    }

    /// Follow a link to `route` and mount whatever page ends up current.
    pub async fn open(&self, route: Route) -> Page {
        self.ctx.navigator.navigate(route);
        self.mount_current().await
    }

    /// Mount the navigator's current route, following guard redirects.
    pub async fn mount_current(&self) -> Page {
        let mut route = self.ctx.navigator.current();
        let mut page = self.mount(route.clone()).await;
        for _ in 0..MAX_REDIRECTS {
            let now = self.ctx.navigator.current();
            if now == route {
                return page;
            }
            debug!(from = %route, to = %now, "following redirect");
            route = now;
            page = self.mount(route.clone()).await;
        }
        if self.ctx.navigator.current() != route {
            warn!(%route, "too many redirects; showing last mounted page");
        }
        page
    }

    #[instrument(skip(self))]
    async fn mount(&self, route: Route) -> Page {
        match route {
            Route::Feed => {
                let vm = ListViewModel::new(self.ctx.clone());
                vm.load_page(1).await;
                Page::Feed(vm)
            }
            Route::Article(id) => {
                let vm = DetailViewModel::new(self.ctx.clone());
                // The error is kept in the page state for rendering.
                let _ = vm.load(id).await;
                Page::Article(vm)
            }
            Route::CreateArticle => {
                let vm = CreateArticleViewModel::new(self.ctx.clone());
                vm.on_mount();
                Page::CreateArticle(vm)
            }
            Route::Login => Page::Login(LoginViewModel::new(self.ctx.clone())),
            Route::NotFound(path) => Page::NotFound(path),
        }
    }
}
