//! HTTP client for the TechEndeavor blog API.
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::model::{ArticleDetail, ArticlePage, Draft, Identity};

pub mod model;

use model::{BlogCreateReq, BlogResp, PaginatedBlogResp, TokenResp, UserResp};

/// Articles per feed page; the API is always asked for this many.
pub const PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("failed to reach the API: {0}")]
    Transport(String),
    #[error("authentication rejected")]
    Unauthorized { detail: Option<String> },
    #[error("not found")]
    NotFound { detail: Option<String> },
    #[error("request rejected ({status})")]
    Validation { status: u16, detail: Option<String> },
    #[error("unexpected status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("invalid API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message supplied by the API in its `detail` field, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail }
            | ApiError::NotFound { detail }
            | ApiError::Validation { detail, .. }
            | ApiError::Status { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Classify a non-success status together with its response body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = model::error_detail(body);
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { detail },
            StatusCode::NOT_FOUND => ApiError::NotFound { detail },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
                status: status.as_u16(),
                detail,
            },
            _ => ApiError::Status {
                status: status.as_u16(),
                detail,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Operations the pages need from the API. `bearer` is the session credential;
/// when `None` the request goes out unauthenticated.
#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError>;

    async fn current_user(&self, bearer: Option<&str>) -> Result<Identity, ApiError>;

    async fn list_articles(
        &self,
        bearer: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<ArticlePage, ApiError>;

    async fn get_article(&self, bearer: Option<&str>, id: i64) -> Result<ArticleDetail, ApiError>;

    async fn create_article(
        &self,
        bearer: Option<&str>,
        draft: &Draft,
    ) -> Result<ArticleDetail, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(cfg.api.user_agent.as_str())
            .timeout(cfg.api.timeout())
            .build()?;
        Ok(Self::with_client(http, cfg.api.url()?))
    }

    pub fn with_base_url(base_url: Url) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("techendeavor/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    fn with_client(http: Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let builder = self.http.request(method, self.endpoint(path)?);
        Ok(match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Build (without sending) the feed request for `page`.
    pub fn build_list_request(
        &self,
        bearer: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<reqwest::Request, ApiError> {
        self.request(Method::GET, "blogs/", bearer)?
            .query(&[("page", page), ("limit", limit)])
            .build()
            .map_err(ApiError::from)
    }

    /// Build (without sending) the create-article request.
    pub fn build_create_request(
        &self,
        bearer: Option<&str>,
        draft: &Draft,
    ) -> Result<reqwest::Request, ApiError> {
        self.request(Method::POST, "blogs/", bearer)?
            .json(&BlogCreateReq::from(draft))
            .build()
            .map_err(ApiError::from)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, authenticated = request.headers().contains_key(reqwest::header::AUTHORIZATION), "sending api request");

        let res = self.http.execute(request).await?;
        let status = res.status();
        debug!(%method, %url, %status, "api response");
        if !status.is_success() {
            return Err(Self::failure(res).await);
        }

        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            warn!(%url, ?err, "undecodable api response");
            ApiError::Decode(err.to_string())
        })
    }

    async fn failure(res: Response) -> ApiError {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        warn!(%status, detail = err.detail().unwrap_or(""), "api request failed");
        err
    }
}

#[async_trait]
impl BlogApi for ApiClient {
    #[instrument(skip_all)]
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let request = self
            .request(Method::POST, "token", None)?
            .form(&[("username", username), ("password", password)])
            .build()?;
        let token: TokenResp = self.execute(request).await?;
        Ok(token.access_token)
    }

    #[instrument(skip_all)]
    async fn current_user(&self, bearer: Option<&str>) -> Result<Identity, ApiError> {
        let request = self.request(Method::GET, "users/me", bearer)?.build()?;
        let user: UserResp = self.execute(request).await?;
        Ok(user.into())
    }

    #[instrument(skip(self, bearer))]
    async fn list_articles(
        &self,
        bearer: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<ArticlePage, ApiError> {
        let request = self.build_list_request(bearer, page, limit)?;
        let resp: PaginatedBlogResp = self.execute(request).await?;
        Ok(resp.into())
    }

    #[instrument(skip(self, bearer))]
    async fn get_article(&self, bearer: Option<&str>, id: i64) -> Result<ArticleDetail, ApiError> {
        let request = self
            .request(Method::GET, &format!("blogs/{id}"), bearer)?
            .build()?;
        let blog: BlogResp = self.execute(request).await?;
        Ok(blog.into())
    }

    #[instrument(skip_all)]
    async fn create_article(
        &self,
        bearer: Option<&str>,
        draft: &Draft,
    ) -> Result<ArticleDetail, ApiError> {
        let request = self.build_create_request(bearer, draft)?;
        let blog: BlogResp = self.execute(request).await?;
        Ok(blog.into())
    }
}
