//! Category API endpoints
//!
//! - GET /api/categories - List with search and sort
//! - GET /api/categories/{id} - One category
//! - POST, PUT /{id}, DELETE /{id} - Admin only

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{ApiPath, ApiQuery, ValidatedJson, HEX_COLOR};
use crate::api::middleware::{self, ApiError, AppState};
use crate::models::{Category, CategorySort, SortOrder, UpdateCategoryInput};
use crate::services::{CategoryQuery, CreateCategoryInput};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: CategorySort,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(regex(path = *HEX_COLOR, message = "Color must be a hex value like #3B82F6"))]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(regex(path = *HEX_COLOR, message = "Color must be a hex value like #3B82F6"))]
    pub color: Option<String>,
}

/// Build the categories router
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/", get(list_categories))
        .route("/{id}", get(get_category))
        .merge(admin)
}

/// GET /api/categories
async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> Json<Vec<Category>> {
    let categories = state
        .category_service
        .list(CategoryQuery {
            search: query.search,
            sort: query.sort,
            order: query.order,
        })
        .await;
    Json(categories)
}

/// GET /api/categories/{id}
async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.get_by_id(id).await?))
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state
        .category_service
        .create(CreateCategoryInput {
            name: body.name,
            description: body.description,
            color: body.color,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .category_service
        .update(
            id,
            UpdateCategoryInput {
                name: body.name,
                description: body.description,
                color: body.color,
            },
        )
        .await?;
    Ok(Json(category))
}

/// DELETE /api/categories/{id}
///
/// Refused with `CATEGORY_IN_USE` while any article references it.
async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.category_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
