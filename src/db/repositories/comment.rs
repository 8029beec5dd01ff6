//! Comment repository
//!
//! This module provides:
//! - `CommentRepository` trait defining the interface for comment data access
//! - `MemoryCommentRepository` backed by a `Table`

use crate::db::{Record, StoreError, Table};
use crate::models::{Comment, CommentStatus};
use async_trait::async_trait;
use std::sync::Arc;

impl Record for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Store a new comment
    async fn create(&self, comment: Comment) -> Comment;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Option<Comment>;

    /// All comments, optionally restricted to one status
    async fn list(&self, status: Option<CommentStatus>) -> Vec<Comment>;

    /// Comments on one article, optionally restricted to one status
    async fn list_by_article(&self, article_id: i64, status: Option<CommentStatus>) -> Vec<Comment>;

    /// Change the moderation status
    async fn set_status(&self, id: i64, status: CommentStatus) -> Option<Comment>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<Comment, StoreError>;

    /// Drop every comment on an article
    async fn delete_by_article(&self, article_id: i64) -> usize;

    /// Number of comments, optionally restricted to one status
    async fn count(&self, status: Option<CommentStatus>) -> usize;
}

/// In-memory comment repository
#[derive(Default)]
pub struct MemoryCommentRepository {
    table: Table<Comment>,
}

impl MemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn CommentRepository> {
        Arc::new(Self::new())
    }
}

fn status_matches(comment: &Comment, status: Option<CommentStatus>) -> bool {
    status.map_or(true, |s| comment.status == s)
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn create(&self, comment: Comment) -> Comment {
        self.table.insert(comment).await
    }

    async fn get_by_id(&self, id: i64) -> Option<Comment> {
        self.table.get(id).await
    }

    async fn list(&self, status: Option<CommentStatus>) -> Vec<Comment> {
        self.table.filter(|c| status_matches(c, status)).await
    }

    async fn list_by_article(&self, article_id: i64, status: Option<CommentStatus>) -> Vec<Comment> {
        self.table
            .filter(|c| c.article_id == article_id && status_matches(c, status))
            .await
    }

    async fn set_status(&self, id: i64, status: CommentStatus) -> Option<Comment> {
        self.table.update_with(id, |c| c.status = status).await
    }

    async fn delete(&self, id: i64) -> Result<Comment, StoreError> {
        self.table.remove(id).await
    }

    async fn delete_by_article(&self, article_id: i64) -> usize {
        self.table.remove_where(|c| c.article_id == article_id).await
    }

    async fn count(&self, status: Option<CommentStatus>) -> usize {
        self.table.count(|c| status_matches(c, status)).await
    }
}
