//! Contact message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an admin has opened the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
}

/// Message left through the contact form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(name: &str, email: &str, subject: Option<String>, message: &str) -> Self {
        Self {
            id: 0,
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            subject: subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message: message.trim().to_string(),
            status: MessageStatus::Unread,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_unread() {
        let message = Message::new("Bob", "Bob@Example.com", Some("  ".to_string()), " hello ");
        assert_eq!(message.status, MessageStatus::Unread);
        assert_eq!(message.email, "bob@example.com");
        assert_eq!(message.subject, None);
        assert_eq!(message.message, "hello");
    }
}
