//! Content provider — published portal pages, read-only.
//!
//! Pages are owned by whoever writes `portal_pages`; this service only reads
//! rows with status `publish`. Menu items reference pages by id.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::ErrorCode;
use crate::sanitize;

pub const PUBLISH_STATUS: &str = "publish";

/// Page picker cap, matching what the admin editor requests.
pub const PAGE_LIST_LIMIT: i64 = 100;

const EXCERPT_WORDS: usize = 55;
const EXCERPT_MORE: &str = "\u{2026}";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to read seed pages: {0}")]
    SeedIo(#[from] std::io::Error),
    #[error("invalid seed pages: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

impl ErrorCode for PageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::SeedIo(_) => "E_STORAGE",
            Self::SeedFormat(_) => "E_STORAGE_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPage {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    PUBLISH_STATUS.to_owned()
}

impl ContentPage {
    /// Fill a blank excerpt from the body.
    #[must_use]
    pub fn with_effective_excerpt(mut self) -> Self {
        if self.excerpt.trim().is_empty() {
            self.excerpt = excerpt_from_body(&self.content);
        }
        self
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PUBLISH_STATUS
    }

    #[must_use]
    pub fn summary(&self) -> PageSummary {
        PageSummary { id: self.id, title: self.title.clone(), slug: self.slug.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// First 55 words of the tag-stripped body, with an ellipsis if truncated.
#[must_use]
pub fn excerpt_from_body(body: &str) -> String {
    let stripped = sanitize::strip_tags(body);
    let words: Vec<&str> = stripped.split_whitespace().collect();
    if words.len() > EXCERPT_WORDS {
        format!("{}{EXCERPT_MORE}", words[..EXCERPT_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// A published page by id, with its effective excerpt.
    async fn published_page(&self, id: i64) -> Result<Option<ContentPage>, PageError>;

    /// Published pages among `ids`, keyed by id. Missing ids are absent.
    async fn published_pages_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, ContentPage>, PageError>;

    /// Published page summaries ordered by title.
    async fn list_published(&self, limit: i64) -> Result<Vec<PageSummary>, PageError>;

    async fn count_published(&self) -> Result<i64, PageError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

type PageRow = (i64, String, String, String, String, String);

fn row_to_page((id, title, slug, content, excerpt, status): PageRow) -> ContentPage {
    ContentPage { id, title, slug, content, excerpt, status }.with_effective_excerpt()
}

pub struct PgContentProvider {
    pool: PgPool,
}

impl PgContentProvider {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContentProvider for PgContentProvider {
    async fn published_page(&self, id: i64) -> Result<Option<ContentPage>, PageError> {
        let row = sqlx::query_as::<_, PageRow>(
            "SELECT id, title, slug, content, excerpt, status
             FROM portal_pages
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(PUBLISH_STATUS)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_page))
    }

    async fn published_pages_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, ContentPage>, PageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, PageRow>(
            "SELECT id, title, slug, content, excerpt, status
             FROM portal_pages
             WHERE id = ANY($1) AND status = $2",
        )
        .bind(ids)
        .bind(PUBLISH_STATUS)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(row_to_page)
            .map(|page| (page.id, page))
            .collect())
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<PageSummary>, PageError> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, title, slug
             FROM portal_pages
             WHERE status = $1
             ORDER BY title ASC, id ASC
             LIMIT $2",
        )
        .bind(PUBLISH_STATUS)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, title, slug)| PageSummary { id, title, slug })
            .collect())
    }

    async fn count_published(&self) -> Result<i64, PageError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM portal_pages WHERE status = $1")
            .bind(PUBLISH_STATUS)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default, Clone)]
pub struct MemoryContentProvider {
    pages: Arc<RwLock<BTreeMap<i64, ContentPage>>>,
}

impl MemoryContentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a page (any status).
    pub async fn insert(&self, page: ContentPage) {
        self.pages.write().await.insert(page.id, page);
    }

    /// Load pages from a JSON array file. A blank slug is derived from the
    /// title. Returns the number of pages loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::SeedIo`] or [`PageError::SeedFormat`].
    pub async fn seed_from_file(&self, path: &Path) -> Result<usize, PageError> {
        let raw = tokio::fs::read(path).await?;
        let pages: Vec<ContentPage> = serde_json::from_slice(&raw)?;
        let count = pages.len();
        for mut page in pages {
            if page.slug.trim().is_empty() {
                page.slug = sanitize::slugify(&page.title);
            }
            self.insert(page).await;
        }
        Ok(count)
    }
}

#[async_trait::async_trait]
impl ContentProvider for MemoryContentProvider {
    async fn published_page(&self, id: i64) -> Result<Option<ContentPage>, PageError> {
        let pages = self.pages.read().await;
        Ok(pages
            .get(&id)
            .filter(|p| p.is_published())
            .cloned()
            .map(ContentPage::with_effective_excerpt))
    }

    async fn published_pages_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, ContentPage>, PageError> {
        let pages = self.pages.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| pages.get(id))
            .filter(|p| p.is_published())
            .map(|p| (p.id, p.clone().with_effective_excerpt()))
            .collect())
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<PageSummary>, PageError> {
        let pages = self.pages.read().await;
        let mut summaries: Vec<PageSummary> = pages
            .values()
            .filter(|p| p.is_published())
            .map(ContentPage::summary)
            .collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        summaries.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(summaries)
    }

    async fn count_published(&self) -> Result<i64, PageError> {
        let pages = self.pages.read().await;
        Ok(i64::try_from(pages.values().filter(|p| p.is_published()).count()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
