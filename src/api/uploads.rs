//! Upload API endpoints
//!
//! - POST /api/uploads - Multipart upload, field `file` or `files`
//! - GET /api/uploads - Caller's uploads (all of them for admins)
//! - GET /api/uploads/{id}, DELETE /api/uploads/{id} - Owner or admin
//!
//! Stored files are served from `/uploads/<stored name>`.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{list_params, ApiPath, ApiQuery, Paginated};
use crate::api::middleware::{self, ApiError, AppState, AuthenticatedUser};
use crate::models::Document;
use crate::services::DocumentServiceError;

#[derive(Debug, Default, Deserialize)]
pub struct UploadListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Result of a multipart upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stored documents
    pub files: Vec<Document>,
    /// One message per rejected file
    pub failed: Vec<String>,
}

/// Build the uploads router
pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state.config.upload.body_limit();

    Router::new()
        .route("/", get(list_uploads).post(upload_files))
        .route("/{id}", get(get_upload).delete(delete_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new("FILE_TOO_LARGE", "Upload exceeds the request size limit")
    } else {
        ApiError::bad_request(e.body_text())
    }
}

/// Read a field, stopping as soon as it exceeds `max` bytes
async fn read_limited(
    mut field: Field<'_>,
    name: &str,
    max: u64,
) -> Result<Result<Vec<u8>, DocumentServiceError>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (data.len() + chunk.len()) as u64 > max {
            return Ok(Err(DocumentServiceError::TooLarge {
                name: name.to_string(),
                max,
            }));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Ok(data))
}

/// POST /api/uploads
///
/// Each file is checked on its own; rejected files are listed in `failed`
/// while the rest are stored. When nothing could be stored the first
/// rejection becomes the response.
async fn upload_files(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = &state.config.upload;
    let documents = &state.document_service;

    let mut files = Vec::new();
    let mut rejected: Vec<DocumentServiceError> = Vec::new();
    let mut seen = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !matches!(field.name(), Some("file") | Some("files")) {
            continue;
        }
        seen += 1;

        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("file-{}", seen));
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if seen > documents.max_files() {
            tracing::debug!(file = %name, "Skipping file over the per-request limit");
            rejected.push(DocumentServiceError::TooMany {
                name,
                max: documents.max_files(),
            });
            continue;
        }
        if !upload.is_type_allowed(&mime_type) {
            rejected.push(DocumentServiceError::UnsupportedType { name, mime_type });
            continue;
        }

        let data = match read_limited(field, &name, upload.max_file_size).await? {
            Ok(data) => data,
            Err(e) => {
                rejected.push(e);
                continue;
            }
        };

        match documents.store(user.id, &name, &mime_type, &data).await {
            Ok(document) => files.push(document),
            Err(DocumentServiceError::Io(e)) => return Err(DocumentServiceError::Io(e).into()),
            Err(e) => rejected.push(e),
        }
    }

    if seen == 0 {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    if files.is_empty() {
        if let Some(first) = rejected.into_iter().next() {
            return Err(first.into());
        }
        return Err(ApiError::bad_request("No file uploaded"));
    }

    let failed = rejected.iter().map(ToString::to_string).collect();
    Ok((StatusCode::CREATED, Json(UploadResponse { files, failed })))
}

/// GET /api/uploads
async fn list_uploads(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(query): ApiQuery<UploadListQuery>,
) -> Json<Paginated<Document>> {
    let result = state
        .document_service
        .list(&user, list_params(query.page, query.limit))
        .await;
    Json(result.into())
}

/// GET /api/uploads/{id}
async fn get_upload(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.document_service.get(&user, id).await?))
}

/// DELETE /api/uploads/{id}
async fn delete_upload(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.document_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
