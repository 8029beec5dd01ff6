//! User API endpoints
//!
//! Listing and deletion are admin only. Reads and profile edits are open
//! to the account itself; the service enforces self-or-admin and keeps
//! role changes to admins.

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{
    list_params, validate_display_name, ApiPath, ApiQuery, Paginated, ValidatedJson,
};
use crate::api::middleware::{self, ApiError, AppState, AuthenticatedUser};
use crate::models::{SortOrder, UpdateUserInput, User, UserRole, UserSort};
use crate::services::UserQuery;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default)]
    pub sort: UserSort,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 500, message = "Avatar URL must be at most 500 characters"))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 200, message = "Website must be at most 200 characters"))]
    pub website: Option<String>,
    pub role: Option<UserRole>,
}

/// Build the users router; every route needs a token
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(list_users))
        .route("/{id}", axum::routing::delete(delete_user))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/{id}", get(get_user).put(update_user))
        .merge(admin)
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ))
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Json<Paginated<User>> {
    let result = state
        .user_service
        .list(UserQuery {
            search: query.search.filter(|s| !s.trim().is_empty()),
            role: query.role,
            sort: query.sort,
            order: query.order,
            params: list_params(query.page, query.limit),
        })
        .await;
    Json(result.into())
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_for(&actor, id).await?))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let input = UpdateUserInput {
        name: body.name,
        email: body.email,
        bio: body.bio,
        avatar_url: body.avatar_url,
        website: body.website,
        role: body.role,
    };
    Ok(Json(state.user_service.update(&actor, id, input).await?))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
