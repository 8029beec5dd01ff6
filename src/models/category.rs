//! Category model
//!
//! Categories are flat labels with a display color. Names are unique without
//! regard to case and `usage_count` tracks how many articles reference one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Color assigned when a category is created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display name (unique, case-insensitive)
    pub name: String,
    /// Category description
    pub description: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
    /// Number of articles in this category
    pub usage_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category. The ID is assigned by the store.
    pub fn new(name: &str, description: Option<String>, color: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.trim().to_string(),
            description: description.unwrap_or_default().trim().to_string(),
            color: color
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Whether any article still references this category
    pub fn is_in_use(&self) -> bool {
        self.usage_count > 0
    }

    /// Apply a partial update
    pub fn apply(&mut self, input: UpdateCategoryInput) {
        if let Some(name) = input.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            self.description = description.trim().to_string();
        }
        if let Some(color) = input.color {
            self.color = color.to_uppercase();
        }
        self.updated_at = Utc::now();
    }
}

/// Input for updating a category
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Sort keys for category listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum CategorySort {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "usageCount")]
    UsageCount,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl CategorySort {
    /// Ascending comparison for this key, ties broken by id
    pub fn compare(&self, a: &Category, b: &Category) -> Ordering {
        let primary = match self {
            CategorySort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            CategorySort::UsageCount => a.usage_count.cmp(&b.usage_count),
            CategorySort::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
