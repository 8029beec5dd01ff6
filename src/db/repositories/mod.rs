//! Repositories
//!
//! One trait per entity plus its in-memory implementation.

pub mod article;
pub mod category;
pub mod comment;
pub mod document;
pub mod like;
pub mod message;
pub mod user;

pub use article::{ArticleRepository, MemoryArticleRepository};
pub use category::{CategoryRepository, MemoryCategoryRepository};
pub use comment::{CommentRepository, MemoryCommentRepository};
pub use document::{DocumentRepository, MemoryDocumentRepository};
pub use like::{LikeRepository, MemoryLikeRepository};
pub use message::{MemoryMessageRepository, MessageRepository};
pub use user::{MemoryUserRepository, UserRepository};
