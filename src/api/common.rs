//! Common API utilities and shared types
//!
//! Extractors that answer with `ApiError` instead of axum's plain-text
//! rejections, the paginated response envelope and shared validators.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::middleware::ApiError;
use crate::models::{ListParams, PagedResult};

// ============================================================================
// Validators
// ============================================================================

/// `#RRGGBB`
pub static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 30;

/// At most ten tags of 1 to 30 characters
#[allow(clippy::ptr_arg)]
pub fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("too_many_tags")
            .with_message(format!("At most {} tags are allowed", MAX_TAGS).into()));
    }
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > MAX_TAG_LENGTH {
            return Err(ValidationError::new("tag_length").with_message(
                format!("Each tag must be 1-{} characters", MAX_TAG_LENGTH).into(),
            ));
        }
    }
    Ok(())
}

/// Reject text that is empty once trimmed
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Cannot be blank".into()));
    }
    Ok(())
}

/// Display name of 2 to 50 characters, counted after trimming
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(ValidationError::new("length")
            .with_message("Name must be 2-50 characters".into()));
    }
    Ok(())
}

// ============================================================================
// Pagination
// ============================================================================

/// Page and limit from the query string, clamped
pub fn list_params(page: Option<u32>, limit: Option<u32>) -> ListParams {
    let defaults = ListParams::default();
    ListParams::new(page.unwrap_or(defaults.page), limit.unwrap_or(defaults.limit))
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
}

/// `{ data, pagination }` envelope for list endpoints
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<PagedResult<T>> for Paginated<T> {
    fn from(result: PagedResult<T>) -> Self {
        let pagination = Pagination {
            page: result.page,
            limit: result.limit,
            total: result.total,
            pages: result.pages(),
        };
        Self {
            data: result.items,
            pagination,
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// JSON body that must also pass its `Validate` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// `Path` with JSON rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` with JSON rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = serde_json::Map::new();
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<serde_json::Value> = field_errors
                .iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    serde_json::Value::String(message)
                })
                .collect();
            details.insert(field.to_string(), serde_json::Value::Array(messages));
        }
        ApiError::with_details(
            "VALIDATION_ERROR",
            "Request validation failed",
            serde_json::Value::Object(details),
        )
    }
}
