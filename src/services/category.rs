//! Category service
//!
//! Implements business logic for category management:
//! - Case-insensitive unique names
//! - Search and sort for listings
//! - Deletion refused while articles still use the category

use crate::db::repositories::CategoryRepository;
use crate::db::StoreError;
use crate::models::{Category, CategorySort, SortOrder, UpdateCategoryInput};
use std::sync::Arc;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("{0}")]
    Duplicate(String),

    #[error("Category not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    InUse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for CategoryServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(msg) => Self::Duplicate(msg),
            StoreError::Rejected(msg) => Self::InUse(msg),
        }
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Default)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CreateCategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Search and ordering for category listings
#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    pub search: Option<String>,
    pub sort: CategorySort,
    /// Defaults to ascending for names, descending otherwise
    pub order: Option<SortOrder>,
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        if input.name.trim().is_empty() {
            return Err(CategoryServiceError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }
        let category = self
            .repo
            .create(Category::new(&input.name, input.description, input.color))
            .await?;
        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .ok_or(CategoryServiceError::NotFound(id))
    }

    pub async fn list(&self, query: CategoryQuery) -> Vec<Category> {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut categories: Vec<Category> = self
            .repo
            .list()
            .await
            .into_iter()
            .filter(|c| match &needle {
                Some(n) => {
                    c.name.to_lowercase().contains(n) || c.description.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect();

        let order = query.order.unwrap_or(match query.sort {
            CategorySort::Name => SortOrder::Asc,
            _ => SortOrder::Desc,
        });
        categories.sort_by(|a, b| order.apply(query.sort.compare(a, b)));
        categories
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CategoryServiceError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }
        Ok(self.repo.update(id, input).await?)
    }

    /// Delete a category no article references
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let category = self.repo.delete_unused(id).await?;
        tracing::info!(category_id = id, name = %category.name, "Category deleted");
        Ok(())
    }

    /// Create any of `names` that do not exist yet
    pub async fn ensure_defaults(&self, names: &[&str]) -> usize {
        let mut created = 0;
        for name in names {
            if self.repo.get_by_name(name).await.is_none()
                && self.create(CreateCategoryInput::new(*name)).await.is_ok()
            {
                created += 1;
            }
        }
        created
    }

    pub async fn count(&self) -> usize {
        self.repo.list().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::MemoryCategoryRepository;

    fn service() -> (CategoryService, Arc<dyn CategoryRepository>) {
        let repo = MemoryCategoryRepository::boxed();
        (CategoryService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_create_defaults_and_duplicates() {
        let (service, _) = service();
        let category = service
            .create(CreateCategoryInput::new("Web Security").with_color("#ff0000"))
            .await
            .unwrap();
        assert_eq!(category.color, "#FF0000");
        assert_eq!(category.usage_count, 0);

        let err = service
            .create(CreateCategoryInput::new(" web security "))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryServiceError::Duplicate(_)));
        assert_eq!(service.count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_in_use_keeps_category() {
        let (service, repo) = service();
        let category = service.create(CreateCategoryInput::new("Malware")).await.unwrap();
        repo.adjust_usage(category.id, 1).await;

        assert!(matches!(
            service.delete(category.id).await,
            Err(CategoryServiceError::InUse(_))
        ));
        assert!(service.get_by_id(category.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_search_and_sort() {
        let (service, repo) = service();
        let crypto = service
            .create(CreateCategoryInput::new("Cryptography").with_description("ciphers"))
            .await
            .unwrap();
        service.create(CreateCategoryInput::new("Appsec")).await.unwrap();
        repo.adjust_usage(crypto.id, 3).await;

        let by_name = service.list(CategoryQuery::default()).await;
        assert_eq!(by_name[0].name, "Appsec");

        let by_usage = service
            .list(CategoryQuery {
                sort: CategorySort::UsageCount,
                ..Default::default()
            })
            .await;
        assert_eq!(by_usage[0].name, "Cryptography");

        let search = service
            .list(CategoryQuery {
                search: Some("CIPHER".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(search.len(), 1);
    }

    #[tokio::test]
    async fn test_update_rename_conflict() {
        let (service, _) = service();
        service.create(CreateCategoryInput::new("One")).await.unwrap();
        let two = service.create(CreateCategoryInput::new("Two")).await.unwrap();

        let rename = UpdateCategoryInput {
            name: Some("ONE".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(two.id, rename).await,
            Err(CategoryServiceError::Duplicate(_))
        ));
        assert!(matches!(
            service.update(999, UpdateCategoryInput::default()).await,
            Err(CategoryServiceError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_ensure_defaults_skips_existing() {
        let (service, _) = service();
        service.create(CreateCategoryInput::new("Cryptography")).await.unwrap();
        let created = service.ensure_defaults(&["Cryptography", "Web Security"]).await;
        assert_eq!(created, 1);
        assert_eq!(service.count().await, 2);
    }
}
