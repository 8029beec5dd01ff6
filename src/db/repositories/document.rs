//! Uploaded document repository

use crate::db::{Record, StoreError, Table};
use crate::models::Document;
use async_trait::async_trait;
use std::sync::Arc;

impl Record for Document {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Document repository trait
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: Document) -> Document;

    async fn get_by_id(&self, id: i64) -> Option<Document>;

    /// Documents uploaded by one user, or all of them for `None`
    async fn list(&self, owner_id: Option<i64>) -> Vec<Document>;

    async fn delete(&self, id: i64) -> Result<Document, StoreError>;
}

/// In-memory document repository
#[derive(Default)]
pub struct MemoryDocumentRepository {
    table: Table<Document>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn DocumentRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn create(&self, document: Document) -> Document {
        self.table.insert(document).await
    }

    async fn get_by_id(&self, id: i64) -> Option<Document> {
        self.table.get(id).await
    }

    async fn list(&self, owner_id: Option<i64>) -> Vec<Document> {
        self.table
            .filter(|d| owner_id.map_or(true, |o| d.owner_id == o))
            .await
    }

    async fn delete(&self, id: i64) -> Result<Document, StoreError> {
        self.table.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_by_owner() {
        let repo = MemoryDocumentRepository::new();
        let doc = repo
            .create(Document::new(1, "a.png", "x.png".to_string(), "image/png", 10))
            .await;
        repo.create(Document::new(2, "b.pdf", "y.pdf".to_string(), "application/pdf", 20))
            .await;

        assert_eq!(doc.url, "/uploads/x.png");
        assert_eq!(repo.list(Some(1)).await.len(), 1);
        assert_eq!(repo.list(None).await.len(), 2);
        assert!(repo.delete(doc.id).await.is_ok());
        assert!(repo.get_by_id(doc.id).await.is_none());
    }
}
