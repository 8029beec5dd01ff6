//! Contact message repository

use crate::db::{Record, StoreError, Table};
use crate::models::{Message, MessageStatus};
use async_trait::async_trait;
use std::sync::Arc;

impl Record for Message {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> Message;

    async fn get_by_id(&self, id: i64) -> Option<Message>;

    /// All messages, optionally restricted to one status
    async fn list(&self, status: Option<MessageStatus>) -> Vec<Message>;

    async fn mark_read(&self, id: i64) -> Option<Message>;

    async fn delete(&self, id: i64) -> Result<Message, StoreError>;

    async fn count(&self, status: Option<MessageStatus>) -> usize;
}

/// In-memory message repository
#[derive(Default)]
pub struct MemoryMessageRepository {
    table: Table<Message>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn MessageRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn create(&self, message: Message) -> Message {
        self.table.insert(message).await
    }

    async fn get_by_id(&self, id: i64) -> Option<Message> {
        self.table.get(id).await
    }

    async fn list(&self, status: Option<MessageStatus>) -> Vec<Message> {
        self.table
            .filter(|m| status.map_or(true, |s| m.status == s))
            .await
    }

    async fn mark_read(&self, id: i64) -> Option<Message> {
        self.table
            .update_with(id, |m| m.status = MessageStatus::Read)
            .await
    }

    async fn delete(&self, id: i64) -> Result<Message, StoreError> {
        self.table.remove(id).await
    }

    async fn count(&self, status: Option<MessageStatus>) -> usize {
        self.table
            .count(|m| status.map_or(true, |s| m.status == s))
            .await
    }
}
