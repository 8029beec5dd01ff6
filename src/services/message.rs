//! Contact message service

use crate::db::repositories::MessageRepository;
use crate::models::{Message, MessageStatus};
use std::sync::Arc;

/// Error types for message service operations
#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    #[error("Message not found: {0}")]
    NotFound(i64),
}

/// Input from the contact form
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// Contact message service
pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, input: ContactInput) -> Message {
        let message = self
            .repo
            .create(Message::new(
                &input.name,
                &input.email,
                input.subject,
                &input.message,
            ))
            .await;
        tracing::info!(message_id = message.id, "Contact message received");
        message
    }

    /// Inbox, newest first
    pub async fn list(&self, status: Option<MessageStatus>) -> Vec<Message> {
        let mut messages = self.repo.list(status).await;
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages
    }

    pub async fn mark_read(&self, id: i64) -> Result<Message, MessageServiceError> {
        self.repo
            .mark_read(id)
            .await
            .ok_or(MessageServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), MessageServiceError> {
        self.repo
            .delete(id)
            .await
            .map_err(|_| MessageServiceError::NotFound(id))?;
        tracing::info!(message_id = id, "Contact message deleted");
        Ok(())
    }

    /// `(total, unread)`
    pub async fn counts(&self) -> (usize, usize) {
        (
            self.repo.count(None).await,
            self.repo.count(Some(MessageStatus::Unread)).await,
        )
    }
}
