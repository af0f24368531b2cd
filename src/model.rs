use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who the current credential belongs to, as reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub contact_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub display_name: String,
}

/// One row of the paged article feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub body_excerpt: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<Author>,
}

/// A single article with its full body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<i64>,
    pub author: Option<Author>,
}

/// A page of summaries plus the metadata needed to build a [`PageWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    pub items: Vec<ArticleSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: Option<u64>,
}

/// Current position within the paged feed. Always `1 <= current_page <= total_pages`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageWindow {
    current_page: u32,
    total_pages: u32,
}

impl PageWindow {
    /// Clamps API metadata into a valid window. An empty feed reports zero
    /// pages; it is still shown as one (empty) page.
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current_page: current_page.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("A title is required.")]
    MissingTitle,
    #[error("Article content is required.")]
    MissingBody,
}

/// Article being composed on the create page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Required-field check. Length and content rules belong to the API.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.body.is_empty() {
            return Err(DraftError::MissingBody);
        }
        Ok(())
    }
}
