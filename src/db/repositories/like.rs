//! Like repository
//!
//! A visitor holds at most one like per article. Toggling checks and
//! mutates under one write guard.

use crate::db::{Record, Table};
use crate::models::Like;
use async_trait::async_trait;
use std::sync::Arc;

impl Record for Like {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Like repository trait
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Add the like if absent, remove it if present. Returns whether the
    /// visitor likes the article afterwards.
    async fn toggle(&self, article_id: i64, visitor_id: &str) -> bool;

    /// Number of likes on an article
    async fn count(&self, article_id: i64) -> usize;

    /// Whether the visitor likes the article
    async fn has_liked(&self, article_id: i64, visitor_id: &str) -> bool;

    /// Likes across every article
    async fn count_all(&self) -> usize;

    /// Drop every like on an article
    async fn delete_by_article(&self, article_id: i64) -> usize;
}

/// In-memory like repository
#[derive(Default)]
pub struct MemoryLikeRepository {
    table: Table<Like>,
}

impl MemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn LikeRepository> {
        Arc::new(Self::new())
    }
}

fn is_like_of(like: &Like, article_id: i64, visitor_id: &str) -> bool {
    like.article_id == article_id && like.visitor_id == visitor_id
}

#[async_trait]
impl LikeRepository for MemoryLikeRepository {
    async fn toggle(&self, article_id: i64, visitor_id: &str) -> bool {
        let like = Like::new(article_id, visitor_id);
        self.table
            .write(|rows| {
                let removed = rows.retain(|l| !is_like_of(l, article_id, &like.visitor_id));
                if removed > 0 {
                    false
                } else {
                    rows.push(like);
                    true
                }
            })
            .await
    }

    async fn count(&self, article_id: i64) -> usize {
        self.table.count(|l| l.article_id == article_id).await
    }

    async fn has_liked(&self, article_id: i64, visitor_id: &str) -> bool {
        let visitor_id = visitor_id.trim();
        self.table
            .find(|l| is_like_of(l, article_id, visitor_id))
            .await
            .is_some()
    }

    async fn count_all(&self) -> usize {
        self.table.count(|_| true).await
    }

    async fn delete_by_article(&self, article_id: i64) -> usize {
        self.table.remove_where(|l| l.article_id == article_id).await
    }
}
