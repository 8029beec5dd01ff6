//! Category repository
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `MemoryCategoryRepository` backed by a `Table`
//!
//! Name uniqueness is case-insensitive and checked under the same write
//! lock as the insert or update. The usage counter never goes below zero.

use crate::db::{Record, StoreError, Table};
use crate::models::{Category, UpdateCategoryInput};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

impl Record for Category {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a category, rejecting a duplicate name
    async fn create(&self, category: Category) -> Result<Category, StoreError>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Option<Category>;

    /// Get category by name, ignoring case
    async fn get_by_name(&self, name: &str) -> Option<Category>;

    /// List all categories
    async fn list(&self) -> Vec<Category>;

    /// Apply a partial update, rejecting a name held by another category.
    /// The usage counter is left as stored.
    async fn update(&self, id: i64, input: UpdateCategoryInput) -> Result<Category, StoreError>;

    /// Add `delta` to the usage counter, clamping at zero
    async fn adjust_usage(&self, id: i64, delta: i64) -> Option<Category>;

    /// Delete a category that no article uses
    async fn delete_unused(&self, id: i64) -> Result<Category, StoreError>;
}

/// In-memory category repository
#[derive(Default)]
pub struct MemoryCategoryRepository {
    table: Table<Category>,
}

impl MemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, StoreError> {
        let name = category.name.clone();
        self.table
            .insert_unique(
                category,
                |c| c.has_name(&name),
                &format!("Category '{}' already exists", name),
            )
            .await
    }

    async fn get_by_id(&self, id: i64) -> Option<Category> {
        self.table.get(id).await
    }

    async fn get_by_name(&self, name: &str) -> Option<Category> {
        self.table.find(|c| c.has_name(name)).await
    }

    async fn list(&self) -> Vec<Category> {
        self.table.all().await
    }

    async fn update(&self, id: i64, input: UpdateCategoryInput) -> Result<Category, StoreError> {
        self.table
            .modify(id, |category, rows| {
                category.apply(input);
                if rows.any_other(id, |c| c.has_name(&category.name)) {
                    return Err(StoreError::Conflict(format!(
                        "Category '{}' already exists",
                        category.name
                    )));
                }
                Ok(())
            })
            .await
            .map(|(category, ())| category)
    }

    async fn adjust_usage(&self, id: i64, delta: i64) -> Option<Category> {
        self.table
            .update_with(id, |c| {
                c.usage_count = (c.usage_count + delta).max(0);
                c.updated_at = Utc::now();
            })
            .await
    }

    async fn delete_unused(&self, id: i64) -> Result<Category, StoreError> {
        self.table
            .remove_if(id, |c| {
                if c.is_in_use() {
                    Err(StoreError::Rejected(format!(
                        "Category '{}' is used by {} article(s)",
                        c.name, c.usage_count
                    )))
                } else {
                    Ok(())
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_ignoring_case() {
        let repo = MemoryCategoryRepository::new();
        repo.create(Category::new("Cryptography", None, None))
            .await
            .unwrap();

        let err = repo
            .create(Category::new("CRYPTOGRAPHY", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(repo.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_name_of_other_category() {
        let repo = MemoryCategoryRepository::new();
        repo.create(Category::new("Malware", None, None)).await.unwrap();
        let web = repo.create(Category::new("Web", None, None)).await.unwrap();

        let rename = UpdateCategoryInput {
            name: Some("malware".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(web.id, rename).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(repo.get_by_id(web.id).await.unwrap().name, "Web");

        let describe = UpdateCategoryInput {
            name: Some("web".to_string()),
            description: Some("OWASP and friends".to_string()),
            ..Default::default()
        };
        let updated = repo.update(web.id, describe).await.unwrap();
        assert_eq!(updated.description, "OWASP and friends");
        assert_eq!(updated.name, "web");
    }

    #[tokio::test]
    async fn test_update_keeps_stored_usage_count() {
        let repo = MemoryCategoryRepository::new();
        let cat = repo.create(Category::new("Forensics", None, None)).await.unwrap();
        repo.adjust_usage(cat.id, 3).await;

        let updated = repo
            .update(
                cat.id,
                UpdateCategoryInput {
                    description: Some("disk images".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.usage_count, 3);
    }

    #[tokio::test]
    async fn test_adjust_usage_clamps_at_zero() {
        let repo = MemoryCategoryRepository::new();
        let cat = repo.create(Category::new("Network", None, None)).await.unwrap();

        assert_eq!(repo.adjust_usage(cat.id, 2).await.unwrap().usage_count, 2);
        assert_eq!(repo.adjust_usage(cat.id, -5).await.unwrap().usage_count, 0);
        assert!(repo.adjust_usage(999, 1).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_unused_refuses_category_in_use() {
        let repo = MemoryCategoryRepository::new();
        let cat = repo.create(Category::new("Threats", None, None)).await.unwrap();
        repo.adjust_usage(cat.id, 1).await;

        assert!(matches!(
            repo.delete_unused(cat.id).await,
            Err(StoreError::Rejected(_))
        ));

        repo.adjust_usage(cat.id, -1).await;
        assert!(repo.delete_unused(cat.id).await.is_ok());
        assert!(repo.get_by_id(cat.id).await.is_none());
        assert_eq!(repo.delete_unused(cat.id).await, Err(StoreError::NotFound(cat.id)));
    }
}
