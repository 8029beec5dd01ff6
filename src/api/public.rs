//! Public site endpoints
//!
//! Anonymous reads of published public articles, visitor comments and
//! likes, and the contact form. The `/admin/...` routes are the
//! moderation side of the same data and need an admin token.

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use validator::Validate;

use crate::api::articles::ArticleListQuery;
use crate::api::common::{validate_not_blank, ApiPath, ApiQuery, Paginated, ValidatedJson};
use crate::api::middleware::{self, ApiError, AppState};
use crate::models::{
    Article, Comment, CommentStatus, CreateCommentInput, LikeSummary, Message, MessageStatus,
};
use crate::services::{ContactInput, TagCount};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(
        length(max = 80, message = "Name must be 1-80 characters"),
        custom(function = "validate_not_blank", message = "Name must be 1-80 characters")
    )]
    pub author_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub author_email: Option<String>,
    #[validate(
        length(max = 2000, message = "Comment must be 1-2000 characters"),
        custom(function = "validate_not_blank", message = "Comment must be 1-2000 characters")
    )]
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[validate(
        length(max = 100, message = "Visitor id must be 1-100 characters"),
        custom(function = "validate_not_blank", message = "Visitor id must be 1-100 characters")
    )]
    pub visitor_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeQuery {
    pub visitor_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(
        length(max = 80, message = "Name must be 1-80 characters"),
        custom(function = "validate_not_blank", message = "Name must be 1-80 characters")
    )]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(max = 150, message = "Subject must be at most 150 characters"))]
    pub subject: Option<String>,
    #[validate(
        length(max = 5000, message = "Message must be 1-5000 characters"),
        custom(function = "validate_not_blank", message = "Message must be 1-5000 characters")
    )]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminKeyRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct AdminKeyResponse {
    pub valid: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentStatusQuery {
    pub status: Option<CommentStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentStatusRequest {
    pub status: CommentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageStatusQuery {
    pub status: Option<MessageStatus>,
}

/// Dashboard counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: usize,
    pub articles: usize,
    pub published_articles: usize,
    pub draft_articles: usize,
    pub total_views: i64,
    pub categories: usize,
    pub comments: usize,
    pub pending_comments: usize,
    pub likes: usize,
    pub messages: usize,
    pub unread_messages: usize,
    pub uploads: usize,
}

/// Build the public router
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin/comments", get(list_comments_for_moderation))
        .route(
            "/admin/comments/{id}",
            patch(moderate_comment).delete(delete_comment),
        )
        .route("/admin/messages", get(list_messages))
        .route("/admin/messages/{id}/read", patch(mark_message_read))
        .route("/admin/messages/{id}", delete(delete_message))
        .route("/admin/stats", get(dashboard_stats))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{id}", get(get_article))
        .route(
            "/articles/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/articles/{id}/likes", get(get_likes).post(toggle_like))
        .route("/tags", get(list_tags))
        .route("/contact", post(submit_contact))
        .route("/admin/verify", post(verify_admin_key))
        .merge(admin)
}

/// GET /api/public/articles
async fn list_articles(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ArticleListQuery>,
) -> Json<Paginated<Article>> {
    let result = state.article_service.list_public(query.into()).await;
    Json(result.into())
}

/// GET /api/public/articles/{id}
///
/// Counts a view on every call.
async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get_public(id).await?))
}

/// GET /api/public/articles/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comment_service.list_approved(id).await?))
}

/// POST /api/public/articles/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .comment_service
        .create(
            id,
            CreateCommentInput {
                parent_id: body.parent_id,
                author_name: body.author_name,
                author_email: body.author_email,
                content: body.content,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/public/articles/{id}/likes?visitorId=
async fn get_likes(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LikeQuery>,
) -> Result<Json<LikeSummary>, ApiError> {
    Ok(Json(
        state
            .comment_service
            .likes(id, query.visitor_id.as_deref())
            .await?,
    ))
}

/// POST /api/public/articles/{id}/likes
async fn toggle_like(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<LikeRequest>,
) -> Result<Json<LikeSummary>, ApiError> {
    Ok(Json(
        state
            .comment_service
            .toggle_like(id, &body.visitor_id)
            .await?,
    ))
}

/// GET /api/public/tags
async fn list_tags(State(state): State<AppState>) -> Json<Vec<TagCount>> {
    Json(state.article_service.tag_counts(None).await)
}

/// POST /api/public/contact
async fn submit_contact(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ContactRequest>,
) -> (StatusCode, Json<Message>) {
    let message = state
        .message_service
        .submit(ContactInput {
            name: body.name,
            email: body.email,
            subject: body.subject,
            message: body.message,
        })
        .await;
    (StatusCode::CREATED, Json(message))
}

/// POST /api/public/admin/verify
///
/// Only answers whether the key matches; it does not grant anything.
async fn verify_admin_key(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AdminKeyRequest>,
) -> Json<AdminKeyResponse> {
    let valid: bool = match state.config.auth.admin_key.as_deref() {
        Some(expected) => expected.as_bytes().ct_eq(body.key.as_bytes()).into(),
        None => false,
    };
    if !valid {
        tracing::warn!("Admin key verification failed");
    }
    Json(AdminKeyResponse { valid })
}

/// GET /api/public/admin/comments?status=
async fn list_comments_for_moderation(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentStatusQuery>,
) -> Json<Vec<Comment>> {
    Json(state.comment_service.list_for_moderation(query.status).await)
}

/// PATCH /api/public/admin/comments/{id}
async fn moderate_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<CommentStatusRequest>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(state.comment_service.set_status(id, body.status).await?))
}

/// DELETE /api/public/admin/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/public/admin/messages?status=
async fn list_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MessageStatusQuery>,
) -> Json<Vec<Message>> {
    Json(state.message_service.list(query.status).await)
}

/// PATCH /api/public/admin/messages/{id}/read
async fn mark_message_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.message_service.mark_read(id).await?))
}

/// DELETE /api/public/admin/messages/{id}
async fn delete_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.message_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/public/admin/stats
async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let (published_articles, draft_articles) = state.article_service.count_by_status().await;
    let (comments, pending_comments) = state.comment_service.counts().await;
    let (messages, unread_messages) = state.message_service.counts().await;

    Json(DashboardStats {
        users: state.user_service.count().await,
        articles: published_articles + draft_articles,
        published_articles,
        draft_articles,
        total_views: state.article_service.total_views().await,
        categories: state.category_service.count().await,
        comments,
        pending_comments,
        likes: state.comment_service.total_likes().await,
        messages,
        unread_messages,
        uploads: state.document_service.count().await,
    })
}
