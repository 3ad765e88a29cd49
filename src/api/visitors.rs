//! Visitor management endpoints: registration, approval workflow,
//! check-in/check-out

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        visit::{CheckInRequest, Visit},
        visitor::{CreateVisitor, UpdateVisitor, Visitor, VisitorQuery, VisitorSummary, VisitorWithHost},
    },
    services::lifecycle::CheckOutTarget,
};

use super::{AuthenticatedUser, PaginatedResponse, PaginatedVisitors};

/// Reject request with the mandatory reason
#[derive(Deserialize, ToSchema)]
pub struct RejectRequest {
    /// Why the visitor was rejected; stored in their notes
    pub reason: String,
}

/// Self-registration from the kiosk (unauthenticated, rate limited)
#[utoipa::path(
    post,
    path = "/public/register",
    tag = "visitors",
    request_body = CreateVisitor,
    responses(
        (status = 201, description = "Visitor registered, awaiting approval", body = Visitor),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Phone or email already registered"),
        (status = 429, description = "Too many registration attempts")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateVisitor>,
) -> AppResult<(StatusCode, Json<Visitor>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visitor = state.services.visitors.register(request, None).await?;
    Ok((StatusCode::CREATED, Json(visitor)))
}

/// Create a visitor from the reception desk
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    request_body = CreateVisitor,
    responses(
        (status = 201, description = "Visitor created", body = Visitor),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Phone or email already registered")
    )
)]
pub async fn create_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateVisitor>,
) -> AppResult<(StatusCode, Json<Visitor>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visitor = state
        .services
        .visitors
        .register(request, Some(claims.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(visitor)))
}

/// List visitors with filters and pagination
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(VisitorQuery),
    responses(
        (status = 200, description = "List of visitors", body = PaginatedVisitors),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_visitors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<VisitorQuery>,
) -> AppResult<Json<PaginatedResponse<VisitorSummary>>> {
    let (visitors, total) = state.services.visitors.search(&query).await?;

    Ok(Json(PaginatedResponse {
        items: visitors,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Visitors awaiting approval, oldest first
#[utoipa::path(
    get,
    path = "/visitors/pending",
    tag = "visitors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending visitors", body = Vec<Visitor>)
    )
)]
pub async fn pending_approvals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Visitor>>> {
    let visitors = state.services.lifecycle.pending_approvals().await?;
    Ok(Json(visitors))
}

/// Get visitor details with the host resolved
#[utoipa::path(
    get,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor details", body = VisitorWithHost),
        (status = 404, description = "Visitor not found")
    )
)]
pub async fn get_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<VisitorWithHost>> {
    let visitor = state.services.visitors.get_with_host(id).await?;
    Ok(Json(visitor))
}

/// Update a visitor's profile
#[utoipa::path(
    put,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    request_body = UpdateVisitor,
    responses(
        (status = 200, description = "Visitor updated", body = Visitor),
        (status = 404, description = "Visitor not found"),
        (status = 409, description = "Phone or email already registered")
    )
)]
pub async fn update_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateVisitor>,
) -> AppResult<Json<Visitor>> {
    claims.require_reception()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visitor = state.services.visitors.update(id, request).await?;
    Ok(Json(visitor))
}

/// Delete a visitor and their visit history (admin only)
#[utoipa::path(
    delete,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    responses(
        (status = 204, description = "Visitor deleted"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Visitor not found")
    )
)]
pub async fn delete_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.visitors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve a visitor
#[utoipa::path(
    post,
    path = "/visitors/{id}/approve",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor approved", body = Visitor),
        (status = 404, description = "Visitor not found"),
        (status = 422, description = "Visitor is already approved")
    )
)]
pub async fn approve_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Visitor>> {
    let visitor = state.services.lifecycle.approve(id, claims.actor()).await?;
    Ok(Json(visitor))
}

/// Reject a visitor, storing the reason
#[utoipa::path(
    post,
    path = "/visitors/{id}/reject",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Visitor rejected", body = Visitor),
        (status = 404, description = "Visitor not found"),
        (status = 422, description = "Visitor is already rejected")
    )
)]
pub async fn reject_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<Visitor>> {
    let visitor = state
        .services
        .lifecycle
        .reject(id, &request.reason, claims.actor())
        .await?;
    Ok(Json(visitor))
}

/// Check a visitor in, issuing a badge
#[utoipa::path(
    post,
    path = "/visitors/{id}/check-in",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Visitor checked in", body = Visit),
        (status = 404, description = "Visitor or visit not found"),
        (status = 409, description = "Visitor is already checked in"),
        (status = 422, description = "Visitor is not approved")
    )
)]
pub async fn check_in_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    request: Option<Json<CheckInRequest>>,
) -> AppResult<Json<Visit>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let visit = state
        .services
        .lifecycle
        .check_in(id, request, claims.actor())
        .await?;
    Ok(Json(visit))
}

/// Check a visitor out of their open visit
#[utoipa::path(
    post,
    path = "/visitors/{id}/check-out",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor checked out", body = Visit),
        (status = 404, description = "Visitor not found"),
        (status = 422, description = "Visitor is not checked in")
    )
)]
pub async fn check_out_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state
        .services
        .lifecycle
        .check_out(CheckOutTarget::Visitor(id), claims.actor())
        .await?;
    Ok(Json(visit))
}
