//! Comment and like service
//!
//! Visitors comment on and like public published articles without an
//! account. Comments wait in `pending` until an admin approves them;
//! likes toggle per visitor id.

use crate::db::repositories::{ArticleRepository, CommentRepository, LikeRepository};
use crate::db::StoreError;
use crate::models::{Article, Comment, CommentStatus, CreateCommentInput, LikeSummary};
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Comment not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for CommentServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(msg) | StoreError::Rejected(msg) => Self::Validation(msg),
        }
    }
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    like_repo: Arc<dyn LikeRepository>,
    article_repo: Arc<dyn ArticleRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        like_repo: Arc<dyn LikeRepository>,
        article_repo: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            comment_repo,
            like_repo,
            article_repo,
        }
    }

    async fn public_article(&self, article_id: i64) -> Result<Article, CommentServiceError> {
        self.article_repo
            .get_by_id(article_id)
            .await
            .filter(Article::is_public)
            .ok_or(CommentServiceError::ArticleNotFound(article_id))
    }

    /// Approved comments on a public article, oldest first
    pub async fn list_approved(&self, article_id: i64) -> Result<Vec<Comment>, CommentServiceError> {
        self.public_article(article_id).await?;
        let mut comments = self
            .comment_repo
            .list_by_article(article_id, Some(CommentStatus::Approved))
            .await;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    /// Leave a comment; it stays hidden until approved
    ///
    /// A reply must point at a comment on the same article.
    pub async fn create(
        &self,
        article_id: i64,
        input: CreateCommentInput,
    ) -> Result<Comment, CommentServiceError> {
        self.public_article(article_id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent_ok = self
                .comment_repo
                .get_by_id(parent_id)
                .await
                .is_some_and(|p| p.article_id == article_id);
            if !parent_ok {
                return Err(CommentServiceError::Validation(format!(
                    "Parent comment {} does not belong to article {}",
                    parent_id, article_id
                )));
            }
        }

        let comment = self
            .comment_repo
            .create(Comment::new(article_id, input))
            .await;
        tracing::info!(comment_id = comment.id, article_id, "Comment submitted for moderation");
        Ok(comment)
    }

    /// Moderation queue, newest first
    pub async fn list_for_moderation(&self, status: Option<CommentStatus>) -> Vec<Comment> {
        let mut comments = self.comment_repo.list(status).await;
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        comments
    }

    pub async fn set_status(
        &self,
        id: i64,
        status: CommentStatus,
    ) -> Result<Comment, CommentServiceError> {
        let comment = self
            .comment_repo
            .set_status(id, status)
            .await
            .ok_or(CommentServiceError::NotFound(id))?;
        tracing::info!(comment_id = id, status = %status, "Comment moderated");
        Ok(comment)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        self.comment_repo.delete(id).await?;
        tracing::info!(comment_id = id, "Comment deleted");
        Ok(())
    }

    /// Like count and whether `visitor_id` is among the likers
    pub async fn likes(
        &self,
        article_id: i64,
        visitor_id: Option<&str>,
    ) -> Result<LikeSummary, CommentServiceError> {
        self.public_article(article_id).await?;
        let liked = match visitor_id {
            Some(v) if !v.trim().is_empty() => self.like_repo.has_liked(article_id, v).await,
            _ => false,
        };
        Ok(LikeSummary {
            count: self.like_repo.count(article_id).await,
            liked,
        })
    }

    /// Flip the visitor's like
    pub async fn toggle_like(
        &self,
        article_id: i64,
        visitor_id: &str,
    ) -> Result<LikeSummary, CommentServiceError> {
        self.public_article(article_id).await?;
        let liked = self.like_repo.toggle(article_id, visitor_id).await;
        Ok(LikeSummary {
            count: self.like_repo.count(article_id).await,
            liked,
        })
    }

    /// Comment counts as `(total, pending)`
    pub async fn counts(&self) -> (usize, usize) {
        (
            self.comment_repo.count(None).await,
            self.comment_repo.count(Some(CommentStatus::Pending)).await,
        )
    }

    pub async fn total_likes(&self) -> usize {
        self.like_repo.count_all().await
    }
}
