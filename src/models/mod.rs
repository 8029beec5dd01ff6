//! Data models
//!
//! Records held by the in-memory store plus the input, sort and pagination
//! types shared by services and handlers.

mod article;
mod category;
mod comment;
mod document;
mod message;
mod user;

pub use article::{
    make_excerpt, normalize_tags, Article, ArticleSort, ArticleStatus, CreateArticleInput,
    ListParams, PagedResult, SortOrder, UpdateArticleInput, Visibility,
};
pub use category::{Category, CategorySort, UpdateCategoryInput, DEFAULT_CATEGORY_COLOR};
pub use comment::{gravatar_url, Comment, CommentStatus, CreateCommentInput, Like, LikeSummary};
pub use document::Document;
pub use message::{Message, MessageStatus};
pub use user::{normalize_email, UpdateUserInput, User, UserRole, UserSort};
