//! Comment and like models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            _ => Err(format!("Invalid comment status: {}", s)),
        }
    }
}

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    #[serde(skip_serializing)]
    pub author_email: Option<String>,
    pub avatar_url: String,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// New visitor comment awaiting moderation
    pub fn new(article_id: i64, input: CreateCommentInput) -> Self {
        let author_email = input
            .author_email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        Self {
            id: 0,
            article_id,
            parent_id: input.parent_id,
            author_name: input.author_name.trim().to_string(),
            avatar_url: gravatar_url(author_email.as_deref()),
            author_email,
            content: input.content.trim().to_string(),
            status: CommentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == CommentStatus::Approved
    }
}

/// Gravatar URL for an email, or the mystery-person default
pub fn gravatar_url(email: Option<&str>) -> String {
    match email {
        Some(e) if !e.is_empty() => {
            let hash = format!("{:x}", md5::compute(e.trim().to_lowercase()));
            format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
        }
        _ => "https://www.gravatar.com/avatar/?d=mp&s=80".to_string(),
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Default)]
pub struct CreateCommentInput {
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub content: String,
}

/// A visitor's like on an article
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub article_id: i64,
    pub visitor_id: String,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(article_id: i64, visitor_id: &str) -> Self {
        Self {
            id: 0,
            article_id,
            visitor_id: visitor_id.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Like count for an article, and whether the asking visitor is among them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeSummary {
    pub count: usize,
    pub liked: bool,
}
