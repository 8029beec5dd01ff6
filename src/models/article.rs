//! Article model
//!
//! This module provides:
//! - `Article` entity representing a blog post
//! - `Visibility` and `ArticleStatus` enums
//! - Input types for creating and updating articles
//! - Pagination and sort types shared by every list query

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Maximum length of a generated excerpt, in characters
pub const EXCERPT_LENGTH: usize = 160;

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Author user ID
    pub author_id: i64,
    /// Category ID
    pub category_id: Option<i64>,
    /// Article title
    pub title: String,
    /// Body text
    pub content: String,
    /// Short summary shown in listings
    pub excerpt: String,
    /// Normalized tags
    pub tags: Vec<String>,
    /// Who may read the article
    pub visibility: Visibility,
    /// Publication status
    pub status: ArticleStatus,
    /// View counter
    pub views: i64,
    /// First publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Build a new article from validated input
    ///
    /// The ID is assigned by the store on insert.
    pub fn new(author_id: i64, input: CreateArticleInput) -> Self {
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let excerpt = match input.excerpt {
            Some(excerpt) if !excerpt.trim().is_empty() => excerpt.trim().to_string(),
            _ => make_excerpt(&input.content),
        };

        Self {
            id: 0,
            author_id,
            category_id: input.category_id,
            title: input.title.trim().to_string(),
            content: input.content,
            excerpt,
            tags: normalize_tags(input.tags),
            visibility: input.visibility.unwrap_or_default(),
            status,
            views: 0,
            published_at: (status == ArticleStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Published and public: readable by anyone
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public && self.status == ArticleStatus::Published
    }

    /// Whether the given user wrote this article
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// Apply a partial update. Returns the previous category when it changed.
    pub fn apply(&mut self, input: UpdateArticleInput) -> Option<Option<i64>> {
        let mut previous_category = None;

        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = input.content {
            self.content = content;
            if input.excerpt.is_none() {
                self.excerpt = make_excerpt(&self.content);
            }
        }
        if let Some(excerpt) = input.excerpt {
            self.excerpt = if excerpt.trim().is_empty() {
                make_excerpt(&self.content)
            } else {
                excerpt.trim().to_string()
            };
        }
        if let Some(tags) = input.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(visibility) = input.visibility {
            self.visibility = visibility;
        }
        if let Some(status) = input.status {
            self.status = status;
            if status == ArticleStatus::Published && self.published_at.is_none() {
                self.published_at = Some(Utc::now());
            }
        }
        if let Some(category_id) = input.category_id {
            if category_id != self.category_id {
                previous_category = Some(self.category_id);
                self.category_id = category_id;
            }
        }

        self.updated_at = Utc::now();
        previous_category
    }

    /// Case-insensitive match against title, excerpt, content and tags
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.excerpt.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.contains(&needle))
    }

    /// Whether the article carries the tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        self.tags.iter().any(|t| *t == tag)
    }
}

/// Derive an excerpt from body text
///
/// Whitespace is collapsed and the text is cut on a character boundary.
pub fn make_excerpt(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= EXCERPT_LENGTH {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(EXCERPT_LENGTH).collect();
    format!("{}...", cut.trim_end())
}

/// Trim, lower-case and deduplicate tags, keeping first-seen order
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Article visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the author and admins can read it
    #[default]
    Private,
    /// Anyone can read it once published
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            _ => Err(format!("Invalid visibility: {}", s)),
        }
    }
}

/// Article publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Draft - only visible to its author
    #[default]
    Draft,
    /// Published
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            _ => Err(format!("Invalid article status: {}", s)),
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Default)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
    pub visibility: Option<Visibility>,
    pub status: Option<ArticleStatus>,
}

/// Input for updating an existing article
///
/// `category_id` is doubly optional: `Some(None)` clears the category.
#[derive(Debug, Clone, Default)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<Option<i64>>,
    pub visibility: Option<Visibility>,
    pub status: Option<ArticleStatus>,
}

/// Sort keys for article listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum ArticleSort {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "views")]
    Views,
    #[serde(rename = "title")]
    Title,
}

impl ArticleSort {
    /// Ascending comparison for this key, ties broken by id
    pub fn compare(&self, a: &Article, b: &Article) -> Ordering {
        let primary = match self {
            ArticleSort::CreatedAt => a.created_at.cmp(&b.created_at),
            ArticleSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            ArticleSort::Views => a.views.cmp(&b.views),
            ArticleSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Orient an ascending ordering
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl ListParams {
    /// Largest page size a client may request
    pub const MAX_LIMIT: u32 = 100;

    /// Create pagination parameters, clamping out-of-range values
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Index of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Size of the whole filtered set
    pub total: usize,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl<T> PagedResult<T> {
    /// Slice an already filtered and sorted set
    pub fn paginate(items: Vec<T>, params: &ListParams) -> Self {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(params.offset())
            .take(params.limit as usize)
            .collect();
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
        }
    }

    /// `ceil(total / limit)`
    pub fn pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as usize) as u32
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    /// Convert the items, keeping the pagination data
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn pages_is_ceiling_of_total_over_limit(total in 0usize..500, limit in 1u32..=100) {
            let items: Vec<usize> = (0..total).collect();
            let page = PagedResult::paginate(items, &ListParams::new(1, limit));
            let expected = (total + limit as usize - 1) / limit as usize;
            prop_assert_eq!(page.pages() as usize, expected);
        }

        #[test]
        fn pages_partition_the_filtered_set(total in 0usize..300, limit in 1u32..=50) {
            let items: Vec<usize> = (0..total).collect();
            let first = PagedResult::paginate(items.clone(), &ListParams::new(1, limit));
            let mut seen = Vec::new();
            for page in 1..=first.pages().max(1) {
                let result = PagedResult::paginate(items.clone(), &ListParams::new(page, limit));
                prop_assert!(result.items.len() <= limit as usize);
                prop_assert_eq!(result.total, total);
                seen.extend(result.items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
