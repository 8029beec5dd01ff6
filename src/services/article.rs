//! Article service
//!
//! Implements business logic for articles:
//! - Visibility rules: anonymous readers see public published articles,
//!   authors also see their own, admins see everything
//! - Filter, sort and paginate listings
//! - Owner-or-admin edits and deletes
//! - Category usage counters follow create, move and delete
//! - Public reads bump the view counter

use crate::db::repositories::{ArticleRepository, CategoryRepository};
use crate::db::StoreError;
use crate::models::{
    Article, ArticleSort, ArticleStatus, CreateArticleInput, ListParams, PagedResult, SortOrder,
    UpdateArticleInput, Visibility,
};
use crate::services::token::AuthUser;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("Article not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,
}

impl From<StoreError> for ArticleServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(msg) | StoreError::Rejected(msg) => Self::Validation(msg),
        }
    }
}

/// Filters for article listings
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub status: Option<ArticleStatus>,
    pub visibility: Option<Visibility>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Only the caller's own articles
    pub mine: bool,
    pub sort: ArticleSort,
    pub order: SortOrder,
    pub params: ListParams,
}

impl ArticleQuery {
    fn matches(&self, article: &Article) -> bool {
        self.status.map_or(true, |s| article.status == s)
            && self.visibility.map_or(true, |v| article.visibility == v)
            && self.author_id.map_or(true, |id| article.author_id == id)
            && self.category_id.map_or(true, |id| article.category_id == Some(id))
            && self.tag.as_deref().map_or(true, |t| article.has_tag(t))
            && self.search.as_deref().map_or(true, |s| article.matches_search(s))
    }
}

/// Tag with the number of visible articles carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Whether `viewer` may see `article` in a listing
fn is_listed_for(article: &Article, viewer: Option<&AuthUser>) -> bool {
    match viewer {
        None => article.is_public(),
        Some(user) if user.is_admin() => true,
        Some(user) => article.is_public() || article.is_owned_by(user.id),
    }
}

/// Article service
pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
    category_repo: Arc<dyn CategoryRepository>,
}

impl ArticleService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        category_repo: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            article_repo,
            category_repo,
        }
    }

    /// Filter → sort → paginate over what the viewer may see
    pub async fn list(
        &self,
        viewer: Option<&AuthUser>,
        query: ArticleQuery,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let mine = match (query.mine, viewer) {
            (true, None) => return Err(ArticleServiceError::Unauthorized),
            (true, Some(user)) => Some(user.id),
            (false, _) => None,
        };

        let mut articles: Vec<Article> = self
            .article_repo
            .list()
            .await
            .into_iter()
            .filter(|a| is_listed_for(a, viewer))
            .filter(|a| mine.map_or(true, |id| a.is_owned_by(id)))
            .filter(|a| query.matches(a))
            .collect();

        articles.sort_by(|a, b| query.order.apply(query.sort.compare(a, b)));
        Ok(PagedResult::paginate(articles, &query.params))
    }

    /// Listing restricted to public published articles whatever the query says
    pub async fn list_public(&self, mut query: ArticleQuery) -> PagedResult<Article> {
        query.mine = false;
        query.status = None;
        query.visibility = None;
        let mut articles: Vec<Article> = self
            .article_repo
            .list()
            .await
            .into_iter()
            .filter(|a| a.is_public() && query.matches(a))
            .collect();

        articles.sort_by(|a, b| query.order.apply(query.sort.compare(a, b)));
        PagedResult::paginate(articles, &query.params)
    }

    /// Tag cloud over the articles the viewer may see, most used first
    pub async fn tag_counts(&self, viewer: Option<&AuthUser>) -> Vec<TagCount> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for article in self.article_repo.list().await {
            if !is_listed_for(&article, viewer) {
                continue;
            }
            for tag in article.tags {
                *counts.entry(tag).or_default() += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags
    }

    /// Read one article
    ///
    /// Owners and admins always see it. Anyone else gets `NotFound` for a
    /// draft and `Forbidden` for a published private article.
    pub async fn get(
        &self,
        viewer: Option<&AuthUser>,
        id: i64,
    ) -> Result<Article, ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await
            .ok_or(ArticleServiceError::NotFound(id))?;

        if viewer.is_some_and(|u| u.can_modify(article.author_id)) {
            return Ok(article);
        }
        if article.status == ArticleStatus::Draft {
            return Err(ArticleServiceError::NotFound(id));
        }
        if article.visibility == Visibility::Private {
            return Err(ArticleServiceError::Forbidden(
                "This article is private".to_string(),
            ));
        }
        Ok(article)
    }

    /// Read a public published article and count the view
    pub async fn get_public(&self, id: i64) -> Result<Article, ArticleServiceError> {
        let mut article = self
            .find_public(id)
            .await
            .ok_or(ArticleServiceError::NotFound(id))?;
        if let Some(views) = self.article_repo.increment_views(id).await {
            article.views = views;
        }
        Ok(article)
    }

    /// Public published article, without counting a view
    pub async fn find_public(&self, id: i64) -> Option<Article> {
        self.article_repo
            .get_by_id(id)
            .await
            .filter(Article::is_public)
    }

    /// Create an article owned by `author`
    pub async fn create(
        &self,
        author: &AuthUser,
        input: CreateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        // Count the usage before the article exists so the category cannot
        // be deleted in between.
        if let Some(category_id) = input.category_id {
            self.reserve_category(category_id).await?;
        }

        let article = self
            .article_repo
            .create(Article::new(author.id, input))
            .await;

        tracing::info!(article_id = article.id, author = author.id, "Article created");
        Ok(article)
    }

    /// Partial update by the owner or an admin
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: i64,
        input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await
            .ok_or(ArticleServiceError::NotFound(id))?;
        if !actor.can_modify(article.author_id) {
            return Err(ArticleServiceError::Forbidden(
                "You can only edit your own articles".to_string(),
            ));
        }

        // The target category is counted up front; the store decides whether
        // the article actually moved, and the counters are settled from that.
        let target = input.category_id.flatten();
        if let Some(category_id) = target {
            self.reserve_category(category_id).await?;
        }

        let (updated, previous) = match self.article_repo.update(id, input).await {
            Ok(result) => result,
            Err(e) => {
                if let Some(category_id) = target {
                    self.category_repo.adjust_usage(category_id, -1).await;
                }
                return Err(e.into());
            }
        };

        match previous {
            Some(old_category) => {
                if let Some(old_category) = old_category {
                    self.category_repo.adjust_usage(old_category, -1).await;
                }
            }
            None => {
                if let Some(category_id) = target {
                    self.category_repo.adjust_usage(category_id, -1).await;
                }
            }
        }
        Ok(updated)
    }

    /// Delete by the owner or an admin
    pub async fn delete(&self, actor: &AuthUser, id: i64) -> Result<(), ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await
            .ok_or(ArticleServiceError::NotFound(id))?;
        if !actor.can_modify(article.author_id) {
            return Err(ArticleServiceError::Forbidden(
                "You can only delete your own articles".to_string(),
            ));
        }

        let article = self.article_repo.delete(id).await?;
        if let Some(category_id) = article.category_id {
            self.category_repo.adjust_usage(category_id, -1).await;
        }

        tracing::info!(article_id = id, actor = actor.id, "Article deleted");
        Ok(())
    }

    /// Article counts by status, for the dashboard
    pub async fn count_by_status(&self) -> (usize, usize) {
        let articles = self.article_repo.list().await;
        let published = articles
            .iter()
            .filter(|a| a.status == ArticleStatus::Published)
            .count();
        (published, articles.len() - published)
    }

    /// Views across every article
    pub async fn total_views(&self) -> i64 {
        self.article_repo.list().await.iter().map(|a| a.views).sum()
    }

    async fn reserve_category(&self, category_id: i64) -> Result<(), ArticleServiceError> {
        self.category_repo
            .adjust_usage(category_id, 1)
            .await
            .map(|_| ())
            .ok_or_else(|| {
                ArticleServiceError::Validation(format!("Category {} does not exist", category_id))
            })
    }
}
