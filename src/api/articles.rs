//! Article API endpoints
//!
//! Reads go through `optional_auth` so the listing can include the
//! caller's own private articles and drafts. Writes need a token and
//! ownership (or the admin role).

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{
    list_params, validate_not_blank, validate_tags, ApiPath, ApiQuery, Paginated, ValidatedJson,
};
use crate::api::middleware::{self, ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{
    Article, ArticleSort, ArticleStatus, CreateArticleInput, SortOrder, UpdateArticleInput,
    Visibility,
};
use crate::services::{ArticleQuery, TagCount};

/// Query string for article listings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub status: Option<ArticleStatus>,
    pub visibility: Option<Visibility>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub sort: ArticleSort,
    #[serde(default)]
    pub order: SortOrder,
}

impl From<ArticleListQuery> for ArticleQuery {
    fn from(q: ArticleListQuery) -> Self {
        Self {
            params: list_params(q.page, q.limit),
            search: q.search.filter(|s| !s.trim().is_empty()),
            tag: q.tag.filter(|t| !t.trim().is_empty()),
            status: q.status,
            visibility: q.visibility,
            author_id: q.author_id,
            category_id: q.category_id,
            mine: q.mine,
            sort: q.sort,
            order: q.order,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[validate(
        length(max = 200, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank", message = "Title must be 1-200 characters")
    )]
    pub title: String,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
    pub visibility: Option<Visibility>,
    pub status: Option<ArticleStatus>,
}

impl From<CreateArticleRequest> for CreateArticleInput {
    fn from(r: CreateArticleRequest) -> Self {
        Self {
            title: r.title,
            content: r.content,
            excerpt: r.excerpt,
            tags: r.tags,
            category_id: r.category_id,
            visibility: r.visibility,
            status: r.status,
        }
    }
}

/// Partial update. `categoryId: null` clears the category.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    #[validate(
        length(max = 200, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank", message = "Title must be 1-200 characters")
    )]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,
    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub visibility: Option<Visibility>,
    pub status: Option<ArticleStatus>,
}

impl From<UpdateArticleRequest> for UpdateArticleInput {
    fn from(r: UpdateArticleRequest) -> Self {
        Self {
            title: r.title,
            content: r.content,
            excerpt: r.excerpt,
            tags: r.tags,
            category_id: r.category_id,
            visibility: r.visibility,
            status: r.status,
        }
    }
}

/// Tell an absent field from an explicit `null`
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Build the articles router
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_article))
        .route("/{id}", put(update_article).delete(delete_article))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .route("/", get(list_articles))
        .route("/tags", get(list_tags))
        .route("/{id}", get(get_article))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
        .merge(protected)
}

/// GET /api/articles
async fn list_articles(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiQuery(query): ApiQuery<ArticleListQuery>,
) -> Result<Json<Paginated<Article>>, ApiError> {
    let result = state
        .article_service
        .list(viewer.user(), query.into())
        .await?;
    Ok(Json(result.into()))
}

/// GET /api/articles/tags
async fn list_tags(State(state): State<AppState>, viewer: MaybeUser) -> Json<Vec<TagCount>> {
    Json(state.article_service.tag_counts(viewer.user()).await)
}

/// GET /api/articles/{id}
async fn get_article(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get(viewer.user(), id).await?))
}

/// POST /api/articles
async fn create_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state.article_service.create(&user, body.into()).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT /api/articles/{id}
async fn update_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(
        state.article_service.update(&user, id, body.into()).await?,
    ))
}

/// DELETE /api/articles/{id}
async fn delete_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.article_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
