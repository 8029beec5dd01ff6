//! API middleware
//!
//! Contains:
//! - `AppState` shared by every handler
//! - `ApiError`, the JSON error body, and its status mapping
//! - Bearer-token authentication (`require_auth`, `optional_auth`)
//! - Role authorization (`require_admin`)
//! - Request statistics

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::repositories::{
    MemoryArticleRepository, MemoryCategoryRepository, MemoryCommentRepository,
    MemoryDocumentRepository, MemoryLikeRepository, MemoryMessageRepository, MemoryUserRepository,
};
use crate::services::token::{bearer_token, AuthUser, TokenError, TokenService};
use crate::services::{
    ArticleService, ArticleServiceError, CategoryService, CategoryServiceError, CommentService,
    CommentServiceError, DocumentService, DocumentServiceError, MessageService,
    MessageServiceError, UserService, UserServiceError,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Sum of response times in microseconds
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.total_response_time_us.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub category_service: Arc<CategoryService>,
    pub comment_service: Arc<CommentService>,
    pub message_service: Arc<MessageService>,
    pub document_service: Arc<DocumentService>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire every service to fresh in-memory repositories
    pub fn new(config: Config) -> Self {
        let users = MemoryUserRepository::boxed();
        let articles = MemoryArticleRepository::boxed();
        let categories = MemoryCategoryRepository::boxed();
        let comments = MemoryCommentRepository::boxed();
        let likes = MemoryLikeRepository::boxed();
        let messages = MemoryMessageRepository::boxed();
        let documents = MemoryDocumentRepository::boxed();

        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);

        Self {
            user_service: Arc::new(UserService::new(users, tokens)),
            article_service: Arc::new(ArticleService::new(articles.clone(), categories.clone())),
            category_service: Arc::new(CategoryService::new(categories)),
            comment_service: Arc::new(CommentService::new(comments, likes, articles)),
            message_service: Arc::new(MessageService::new(messages)),
            document_service: Arc::new(DocumentService::new(documents, config.upload.clone())),
            request_stats: Arc::new(RequestStats::new()),
            config: Arc::new(config),
        }
    }

    /// Build the state and load startup data
    pub async fn seeded(config: Config) -> anyhow::Result<Self> {
        let state = Self::new(config);
        crate::services::seed::seed(
            &state.config,
            &state.user_service,
            &state.category_service,
            &state.article_service,
        )
        .await?;
        Ok(state)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Log the cause and answer with a generic message
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Internal error");
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    /// HTTP status for the error code
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" | "DUPLICATE" | "CATEGORY_IN_USE" | "FILE_TOO_LARGE"
            | "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" | "INVALID_TOKEN" | "TOKEN_EXPIRED" | "INVALID_CREDENTIALS" => {
                StatusCode::UNAUTHORIZED
            }
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "TOO_MANY_REQUESTS" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.error.code, message = %self.error.message, "Request failed");
        }
        (status, Json(self)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Missing => ApiError::unauthorized("Missing authentication token"),
            TokenError::Expired => ApiError::new("TOKEN_EXPIRED", "Token has expired"),
            TokenError::Malformed | TokenError::InvalidClaims(_) => {
                ApiError::new("INVALID_TOKEN", e.to_string())
            }
            TokenError::Signing(_) => ApiError::internal_error(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::Validation(msg) => ApiError::validation_error(msg),
            UserServiceError::Duplicate(msg) => ApiError::new("DUPLICATE", msg),
            UserServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            UserServiceError::InvalidCredentials => {
                ApiError::new("INVALID_CREDENTIALS", e.to_string())
            }
            UserServiceError::RateLimited => ApiError::new("TOO_MANY_REQUESTS", e.to_string()),
            UserServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            UserServiceError::Token(e) => e.into(),
            UserServiceError::Internal(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ArticleServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ArticleServiceError::Validation(msg) => ApiError::validation_error(msg),
            ArticleServiceError::Unauthorized => ApiError::unauthorized(e.to_string()),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::Duplicate(msg) => ApiError::new("DUPLICATE", msg),
            CategoryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            CategoryServiceError::InUse(msg) => ApiError::new("CATEGORY_IN_USE", msg),
            CategoryServiceError::Validation(msg) => ApiError::validation_error(msg),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::ArticleNotFound(_) | CommentServiceError::NotFound(_) => {
                ApiError::not_found(e.to_string())
            }
            CommentServiceError::Validation(msg) => ApiError::validation_error(msg),
        }
    }
}

impl From<MessageServiceError> for ApiError {
    fn from(e: MessageServiceError) -> Self {
        ApiError::not_found(e.to_string())
    }
}

impl From<DocumentServiceError> for ApiError {
    fn from(e: DocumentServiceError) -> Self {
        match e {
            DocumentServiceError::TooLarge { .. } => ApiError::new("FILE_TOO_LARGE", e.to_string()),
            DocumentServiceError::UnsupportedType { .. }
            | DocumentServiceError::Empty(_)
            | DocumentServiceError::TooMany { .. } => {
                ApiError::validation_error(e.to_string())
            }
            DocumentServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            DocumentServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            DocumentServiceError::Io(_) => ApiError::internal_error(e),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

/// The caller, if a valid token came with the request
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

fn authorization_header(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Verify the token and confirm the account still exists
///
/// The stored role wins over the one in the token, so a demotion takes
/// effect before the token expires.
async fn authenticate(state: &AppState, header: Option<&str>) -> Result<AuthUser, ApiError> {
    let token = bearer_token(header)?;
    let identity = state.user_service.tokens().verify(token)?;

    let user = state
        .user_service
        .get_by_id(identity.id)
        .await
        .map_err(|_| ApiError::new("INVALID_TOKEN", "Account no longer exists"))?;

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, authorization_header(&request))
        .await
        .inspect_err(|e| tracing::debug!(code = %e.error.code, "Authentication failed"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Absent or bad tokens leave the request anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if authorization_header(&request).is_some() {
        if let Ok(user) = authenticate(&state, authorization_header(&request)).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use axum::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            ("VALIDATION_ERROR", StatusCode::BAD_REQUEST),
            ("DUPLICATE", StatusCode::BAD_REQUEST),
            ("CATEGORY_IN_USE", StatusCode::BAD_REQUEST),
            ("FILE_TOO_LARGE", StatusCode::BAD_REQUEST),
            ("UNAUTHORIZED", StatusCode::UNAUTHORIZED),
            ("INVALID_TOKEN", StatusCode::UNAUTHORIZED),
            ("TOKEN_EXPIRED", StatusCode::UNAUTHORIZED),
            ("INVALID_CREDENTIALS", StatusCode::UNAUTHORIZED),
            ("FORBIDDEN", StatusCode::FORBIDDEN),
            ("NOT_FOUND", StatusCode::NOT_FOUND),
            ("TOO_MANY_REQUESTS", StatusCode::TOO_MANY_REQUESTS),
            ("SOMETHING_ELSE", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(ApiError::new(code, "x").status(), status, "{}", code);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::with_details(
            "VALIDATION_ERROR",
            "Invalid input",
            serde_json::json!({"title": ["too long"]}),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "Invalid input");
        assert_eq!(json["error"]["details"]["title"][0], "too long");
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::internal_error("disk on fire");
        assert_eq!(error.error.message, "Internal server error");
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_error_codes() {
        assert_eq!(ApiError::from(TokenError::Missing).error.code, "UNAUTHORIZED");
        assert_eq!(ApiError::from(TokenError::Expired).error.code, "TOKEN_EXPIRED");
        assert_eq!(ApiError::from(TokenError::Malformed).error.code, "INVALID_TOKEN");
        assert_eq!(
            ApiError::from(TokenError::InvalidClaims("role".to_string())).error.code,
            "INVALID_TOKEN"
        );
    }

    #[test]
    fn test_service_error_codes() {
        assert_eq!(
            ApiError::from(CategoryServiceError::InUse("busy".to_string())).error.code,
            "CATEGORY_IN_USE"
        );
        assert_eq!(
            ApiError::from(UserServiceError::Duplicate("taken".to_string())).error.code,
            "DUPLICATE"
        );
        assert_eq!(
            ApiError::from(UserServiceError::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(DocumentServiceError::TooLarge {
                name: "a".to_string(),
                max: 1
            })
            .error
            .code,
            "FILE_TOO_LARGE"
        );
        assert_eq!(
            ApiError::from(ArticleServiceError::Forbidden("no".to_string())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deleted_account() {
        let state = AppState::new(Config::default());
        let session = state
            .user_service
            .register(crate::services::RegisterInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        let header = format!("Bearer {}", session.token);

        let user = authenticate(&state, Some(&header)).await.unwrap();
        assert_eq!(user.role, UserRole::Admin);

        let other = AuthUser {
            id: 999,
            email: "root@example.com".to_string(),
            role: UserRole::Admin,
        };
        state.user_service.delete(&other, session.user.id).await.unwrap();

        let err = authenticate(&state, Some(&header)).await.unwrap_err();
        assert_eq!(err.error.code, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_admin_route_layering() {
        use axum::{body::Body, middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
        use tower::ServiceExt;

        let state = AppState::new(Config::default());
        let register = |name: &str, email: &str| crate::services::RegisterInput {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        };
        let admin = state
            .user_service
            .register(register("Admin", "admin@example.com"))
            .await
            .unwrap();
        let user = state
            .user_service
            .register(register("Reader", "reader@example.com"))
            .await
            .unwrap();

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(from_fn(require_admin))
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state);

        let call = |token: Option<String>| {
            let mut builder = axum::http::Request::builder().uri("/");
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            app.clone().oneshot(builder.body(Body::empty()).unwrap())
        };

        assert_eq!(call(None).await.unwrap().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(Some(user.token)).await.unwrap().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(call(Some(admin.token)).await.unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);
        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }
}
