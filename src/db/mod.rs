//! Storage layer
//!
//! Everything lives in process memory. Each entity has a `Table` and a
//! repository trait in front of it, so services depend on the trait and
//! never on the storage itself.
//!
//! # Usage
//!
//! ```ignore
//! use cyberblog::db::repositories::{CategoryRepository, MemoryCategoryRepository};
//!
//! let repo = MemoryCategoryRepository::boxed();
//! let category = repo.create(Category::new("Web Security", None, None)).await?;
//! ```

pub mod repositories;
pub mod table;

pub use table::{Record, Rows, Table};

/// Errors raised by store mutations
///
/// Reads never fail; they return `Option` or `Vec`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(i64),

    /// A uniqueness rule would be broken
    #[error("{0}")]
    Conflict(String),

    /// A guard refused the mutation
    #[error("{0}")]
    Rejected(String),
}
