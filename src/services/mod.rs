//! Services layer - Business logic
//!
//! Services own the rules: who may see or change what, uniqueness and
//! in-use checks, listing semantics, and the side effects (usage counters,
//! files on disk, tokens). Handlers stay thin and translate errors.

pub mod article;
pub mod category;
pub mod comment;
pub mod document;
pub mod message;
pub mod password;
pub mod rate_limiter;
pub mod seed;
pub mod token;
pub mod user;

pub use article::{ArticleQuery, ArticleService, ArticleServiceError, TagCount};
pub use category::{CategoryQuery, CategoryService, CategoryServiceError, CreateCategoryInput};
pub use comment::{CommentService, CommentServiceError};
pub use document::{DocumentService, DocumentServiceError};
pub use message::{ContactInput, MessageService, MessageServiceError};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use token::{AuthUser, Claims, TokenError, TokenService};
pub use user::{AuthSession, LoginInput, RegisterInput, UserQuery, UserService, UserServiceError};
