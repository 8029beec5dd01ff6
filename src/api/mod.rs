//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - `/api/auth` - registration, login, current user, password change
//! - `/api/articles` - article CRUD with visibility rules
//! - `/api/categories` - category listing and admin management
//! - `/api/users` - profiles and admin user management
//! - `/api/uploads` - multipart uploads and the caller's documents
//! - `/api/public` - anonymous reading, comments, likes, contact, moderation
//! - `/api/health` - liveness and request counters
//!
//! Uploaded files are served from `/uploads`.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod common;
pub mod middleware;
pub mod public;
pub mod uploads;
pub mod users;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, RequestStats};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub avg_response_time_us: f64,
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = &state.request_stats;
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: stats.uptime_seconds(),
        total_requests: stats.total_requests(),
        avg_response_time_us: stats.avg_response_time_us(),
    })
}

/// Unknown routes answer with the JSON error body
async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Auth routes that need a token
    let protected_auth = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth),
    );

    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::public_router().merge(protected_auth))
        .nest("/articles", articles::router(state.clone()))
        .nest("/categories", categories::router(state.clone()))
        .nest("/users", users::router(state.clone()))
        .nest("/uploads", uploads::router(state.clone()))
        .nest("/public", public::router(state))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "Invalid frontend URL, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let uploads_dir = state.config.upload.path.clone();
    let cors = cors_layer(&state.config.server.frontend_url);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(not_found)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
