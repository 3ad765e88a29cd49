//! Staff management endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, HostSummary, User, UserQuery},
};

use super::{AuthenticatedUser, PaginatedResponse, PaginatedUsers};

/// Pick-list of staff who can host visitors
#[utoipa::path(
    get,
    path = "/hosts",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available hosts", body = Vec<HostSummary>)
    )
)]
pub async fn list_hosts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<HostSummary>>> {
    let hosts = state.services.auth.hosts().await?;
    Ok(Json(hosts))
}

/// List staff accounts (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedUsers),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    claims.require_admin()?;

    let (users, total) = state.services.auth.list_users(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Create a staff account (admin only)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "Login already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.services.auth.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
