//! Wire shapes of the blog API and their mapping into domain types.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{ArticleDetail, ArticlePage, ArticleSummary, Author, Draft, Identity};

#[derive(Deserialize, Debug)]
pub struct TokenResp {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UserResp {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct AuthorResp {
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct BlogResp {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub author: Option<AuthorResp>,
}

#[derive(Deserialize, Debug)]
pub struct PaginatedBlogResp {
    pub items: Vec<BlogResp>,
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug)]
pub struct BlogCreateReq<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a Draft> for BlogCreateReq<'a> {
    fn from(draft: &'a Draft) -> Self {
        Self {
            title: &draft.title,
            content: &draft.body,
        }
    }
}

/// Error payload; `detail` is a string for handled errors and a list of
/// `{ msg, .. }` objects for request validation failures.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorResp {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResp {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(entries) => {
                let msgs: Vec<&str> = entries
                    .iter()
                    .filter_map(|e| e.get("msg").and_then(Value::as_str))
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body, if it carries one.
pub fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResp>(body)
        .ok()
        .and_then(|resp| resp.message())
}

/// Accepts RFC 3339 timestamps and the naive ISO form the API emits for UTC
/// columns (`2024-05-01T10:00:00.123456`).
fn utc_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl From<UserResp> for Identity {
    fn from(user: UserResp) -> Self {
        Self {
            display_name: user.username,
            contact_address: user.email,
        }
    }
}

impl From<AuthorResp> for Author {
    fn from(author: AuthorResp) -> Self {
        Self {
            display_name: author.username,
        }
    }
}

impl From<BlogResp> for ArticleSummary {
    fn from(blog: BlogResp) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            body_excerpt: blog.content,
            created_at: blog.created_at,
            author: blog.author.map(Author::from),
        }
    }
}

impl From<BlogResp> for ArticleDetail {
    fn from(blog: BlogResp) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            body: blog.content,
            created_at: blog.created_at,
            author_id: blog.author_id,
            author: blog.author.map(Author::from),
        }
    }
}

impl From<PaginatedBlogResp> for ArticlePage {
    fn from(resp: PaginatedBlogResp) -> Self {
        Self {
            items: resp.items.into_iter().map(ArticleSummary::from).collect(),
            page: resp.page,
            total_pages: resp.total_pages,
            total_count: resp.total_count,
        }
    }
}
