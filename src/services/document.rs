//! Upload storage service
//!
//! Files land in the configured upload directory under a random name and
//! are served back from `/uploads`. Each stored file gets a `Document`
//! record tying it to the uploader.

use crate::config::UploadConfig;
use crate::db::repositories::DocumentRepository;
use crate::models::{Document, ListParams, PagedResult};
use crate::services::token::AuthUser;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// Error types for document service operations
#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error("{name}: file too large (max {max} bytes)")]
    TooLarge { name: String, max: u64 },

    #[error("{name}: file type {mime_type} is not allowed")]
    UnsupportedType { name: String, mime_type: String },

    #[error("{0}: file is empty")]
    Empty(String),

    #[error("{name}: more than {max} files in one request")]
    TooMany { name: String, max: usize },

    #[error("Document not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document service
pub struct DocumentService {
    repo: Arc<dyn DocumentRepository>,
    config: UploadConfig,
}

impl DocumentService {
    pub fn new(repo: Arc<dyn DocumentRepository>, config: UploadConfig) -> Self {
        Self { repo, config }
    }

    /// Largest number of files one upload request may carry
    pub fn max_files(&self) -> usize {
        self.config.max_files
    }

    /// Check a file before it is written
    pub fn check(&self, name: &str, mime_type: &str, size: u64) -> Result<(), DocumentServiceError> {
        if !self.config.is_type_allowed(mime_type) {
            return Err(DocumentServiceError::UnsupportedType {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
            });
        }
        if size > self.config.max_file_size {
            return Err(DocumentServiceError::TooLarge {
                name: name.to_string(),
                max: self.config.max_file_size,
            });
        }
        if size == 0 {
            return Err(DocumentServiceError::Empty(name.to_string()));
        }
        Ok(())
    }

    /// Write a file to disk and record it
    pub async fn store(
        &self,
        owner_id: i64,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Document, DocumentServiceError> {
        self.check(original_name, mime_type, data.len() as u64)?;

        fs::create_dir_all(&self.config.path).await?;
        let stored_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            UploadConfig::extension_for(mime_type)
        );
        fs::write(self.config.path.join(&stored_name), data).await?;

        let document = self
            .repo
            .create(Document::new(
                owner_id,
                original_name,
                stored_name,
                mime_type,
                data.len() as u64,
            ))
            .await;
        tracing::info!(document_id = document.id, owner = owner_id, size = document.size, "File uploaded");
        Ok(document)
    }

    /// The caller's documents, or all of them for an admin; newest first
    pub async fn list(&self, actor: &AuthUser, params: ListParams) -> PagedResult<Document> {
        let owner = (!actor.is_admin()).then_some(actor.id);
        let mut documents = self.repo.list(owner).await;
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        PagedResult::paginate(documents, &params)
    }

    pub async fn get(&self, actor: &AuthUser, id: i64) -> Result<Document, DocumentServiceError> {
        let document = self
            .repo
            .get_by_id(id)
            .await
            .ok_or(DocumentServiceError::NotFound(id))?;
        if !actor.can_modify(document.owner_id) {
            return Err(DocumentServiceError::Forbidden(
                "You can only access your own uploads".to_string(),
            ));
        }
        Ok(document)
    }

    /// Delete the record and the file behind it
    pub async fn delete(&self, actor: &AuthUser, id: i64) -> Result<(), DocumentServiceError> {
        self.get(actor, id).await?;
        let document = self
            .repo
            .delete(id)
            .await
            .map_err(|_| DocumentServiceError::NotFound(id))?;

        match fs::remove_file(self.config.path.join(&document.stored_name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(document_id = id, "Uploaded file was already gone");
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(document_id = id, actor = actor.id, "File deleted");
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.repo.list(None).await.len()
    }
}
