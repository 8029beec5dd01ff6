//! Article repository
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `MemoryArticleRepository` backed by a `Table`
//!
//! Filtering, sorting and pagination happen in the article service; the
//! repository only hands out snapshots and applies single-row mutations.

use crate::db::{Record, StoreError, Table};
use crate::models::{Article, UpdateArticleInput};
use async_trait::async_trait;
use std::sync::Arc;

impl Record for Article {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Store a new article and return it with its ID
    async fn create(&self, article: Article) -> Article;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Option<Article>;

    /// Snapshot of every article
    async fn list(&self) -> Vec<Article>;

    /// Apply a partial update to the stored article
    ///
    /// Returns the updated article and, when the category changed, the
    /// category it had before. The view counter is left as stored.
    async fn update(
        &self,
        id: i64,
        input: UpdateArticleInput,
    ) -> Result<(Article, Option<Option<i64>>), StoreError>;

    /// Bump the view counter, returning the new value
    async fn increment_views(&self, id: i64) -> Option<i64>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<Article, StoreError>;
}

/// In-memory article repository
#[derive(Default)]
pub struct MemoryArticleRepository {
    table: Table<Article>,
}

impl MemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticleRepository {
    async fn create(&self, article: Article) -> Article {
        self.table.insert(article).await
    }

    async fn get_by_id(&self, id: i64) -> Option<Article> {
        self.table.get(id).await
    }

    async fn list(&self) -> Vec<Article> {
        self.table.all().await
    }

    async fn update(
        &self,
        id: i64,
        input: UpdateArticleInput,
    ) -> Result<(Article, Option<Option<i64>>), StoreError> {
        self.table
            .modify(id, |article, _| Ok(article.apply(input)))
            .await
    }

    async fn increment_views(&self, id: i64) -> Option<i64> {
        self.table
            .update_with(id, |a| a.views += 1)
            .await
            .map(|a| a.views)
    }

    async fn delete(&self, id: i64) -> Result<Article, StoreError> {
        self.table.remove(id).await
    }
}
