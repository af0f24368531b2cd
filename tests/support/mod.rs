#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use techendeavor::api::{ApiError, BlogApi};
use techendeavor::model::{ArticleDetail, ArticlePage, ArticleSummary, Draft, Identity};
use techendeavor::pages::PageContext;
use techendeavor::session::{MemoryCredentialStore, SessionStore};
use techendeavor::shell::navigator::Navigator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { username: String },
    CurrentUser { bearer: Option<String> },
    List { bearer: Option<String>, page: u32, limit: u32 },
    Get { bearer: Option<String>, id: i64 },
    Create { bearer: Option<String>, draft: Draft },
}

/// Scriptable stand-in for the blog API. Unscripted calls succeed with
/// plausible data; `list` responses can be held back per page with a gate.
#[derive(Default)]
pub struct RecordingApi {
    pub total_pages: u32,
    calls: Mutex<Vec<Call>>,
    list_errors: Mutex<HashMap<u32, ApiError>>,
    list_gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
    get_errors: Mutex<VecDeque<ApiError>>,
    create_results: Mutex<VecDeque<Result<i64, ApiError>>>,
    login_results: Mutex<VecDeque<Result<String, ApiError>>>,
    me_results: Mutex<VecDeque<Result<Identity, ApiError>>>,
    submit_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl RecordingApi {
    pub fn with_pages(total_pages: u32) -> Self {
        Self {
            total_pages,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_list(&self, page: u32, err: ApiError) {
        self.list_errors.lock().unwrap().insert(page, err);
    }

    /// Hold the response for `page` until the returned sender fires.
    pub fn gate_list(&self, page: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().unwrap().insert(page, rx);
        tx
    }

    /// Hold the next login or create call until the sender fires.
    pub fn gate_submit(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.submit_gate.lock().unwrap() = Some(rx);
        tx
    }

    async fn wait_submit_gate(&self) {
        let gate = self.submit_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    pub fn fail_get(&self, err: ApiError) {
        self.get_errors.lock().unwrap().push_back(err);
    }

    pub fn script_create(&self, result: Result<i64, ApiError>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub fn script_login(&self, result: Result<String, ApiError>) {
        self.login_results.lock().unwrap().push_back(result);
    }

    pub fn script_me(&self, result: Result<Identity, ApiError>) {
        self.me_results.lock().unwrap().push_back(result);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn ada() -> Identity {
    Identity {
        display_name: "ada".into(),
        contact_address: "ada@example.com".into(),
    }
}

pub fn summary(id: i64, title: &str) -> ArticleSummary {
    ArticleSummary {
        id,
        title: title.to_string(),
        body_excerpt: format!("body of {title}"),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        author: None,
    }
}

pub fn detail(id: i64, title: &str, body: &str) -> ArticleDetail {
    ArticleDetail {
        id,
        title: title.to_string(),
        body: body.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        author_id: Some(1),
        author: None,
    }
}

#[async_trait]
impl BlogApi for RecordingApi {
    async fn login(&self, username: &str, _password: &str) -> Result<String, ApiError> {
        self.record(Call::Login {
            username: username.to_string(),
        });
        self.wait_submit_gate().await;
        let scripted = self.login_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok("issued-token".into()))
    }

    async fn current_user(&self, bearer: Option<&str>) -> Result<Identity, ApiError> {
        self.record(Call::CurrentUser {
            bearer: bearer.map(str::to_string),
        });
        let scripted = self.me_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(ada()))
    }

    async fn list_articles(
        &self,
        bearer: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<ArticlePage, ApiError> {
        self.record(Call::List {
            bearer: bearer.map(str::to_string),
            page,
            limit,
        });
        let gate = self.list_gates.lock().unwrap().remove(&page);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.list_errors.lock().unwrap().get(&page).cloned() {
            return Err(err);
        }
        Ok(ArticlePage {
            items: vec![summary(i64::from(page) * 100, &format!("page {page} lead"))],
            page,
            total_pages: self.total_pages,
            total_count: Some(u64::from(self.total_pages) * 25),
        })
    }

    async fn get_article(&self, bearer: Option<&str>, id: i64) -> Result<ArticleDetail, ApiError> {
        self.record(Call::Get {
            bearer: bearer.map(str::to_string),
            id,
        });
        if let Some(err) = self.get_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(detail(id, &format!("article {id}"), "full text"))
    }

    async fn create_article(
        &self,
        bearer: Option<&str>,
        draft: &Draft,
    ) -> Result<ArticleDetail, ApiError> {
        self.record(Call::Create {
            bearer: bearer.map(str::to_string),
            draft: draft.clone(),
        });
        self.wait_submit_gate().await;
        let scripted = self.create_results.lock().unwrap().pop_front();
        let id = scripted.unwrap_or(Ok(1))?;
        Ok(detail(id, &draft.title, &draft.body))
    }
}

pub struct Harness {
    pub api: Arc<RecordingApi>,
    pub storage: Arc<MemoryCredentialStore>,
    pub ctx: PageContext,
}

impl Harness {
    pub fn signed_out(api: RecordingApi) -> Self {
        Self::build(api, MemoryCredentialStore::default())
    }

    /// Session restored from storage holding `credential`.
    pub async fn restored(api: RecordingApi, credential: &str) -> Self {
        let harness = Self::build(api, MemoryCredentialStore::with_credential(credential));
        assert!(harness.ctx.session.restore().await);
        harness
    }

    fn build(api: RecordingApi, storage: MemoryCredentialStore) -> Self {
        let api = Arc::new(api);
        let storage = Arc::new(storage);
        let session = Arc::new(SessionStore::new(storage.clone()));
        let ctx = PageContext::new(api.clone(), session, Arc::new(Navigator::default()));
        Self { api, storage, ctx }
    }

    pub fn list_calls(&self) -> Vec<u32> {
        self.api
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }
}

pub fn unauthorized() -> ApiError {
    ApiError::Unauthorized {
        detail: Some("Could not validate credentials".into()),
    }
}
