//! Uploaded document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file stored under the upload directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    /// Uploading user
    pub owner_id: i64,
    /// File name as sent by the client
    pub original_name: String,
    /// Generated name on disk
    pub stored_name: String,
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Public URL under `/uploads`
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(owner_id: i64, original_name: &str, stored_name: String, mime_type: &str, size: u64) -> Self {
        Self {
            id: 0,
            owner_id,
            original_name: original_name.to_string(),
            url: format!("/uploads/{}", stored_name),
            stored_name,
            mime_type: mime_type.to_string(),
            size,
            created_at: Utc::now(),
        }
    }
}
