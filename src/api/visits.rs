//! Visit endpoints: scheduling, dashboards, check-out and emergency checkout

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::visit::{CheckedInEntry, CreateVisit, EmergencyCheckoutResponse, Visit, VisitQuery},
    services::lifecycle::CheckOutTarget,
};

use super::{AuthenticatedUser, PaginatedResponse, PaginatedVisits};

fn parse_day_start(s: &str) -> AppResult<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc())
        .map_err(|_| AppError::Validation("Invalid date format. Use YYYY-MM-DD".to_string()))
}

fn parse_day_end_exclusive(s: &str) -> AppResult<DateTime<Utc>> {
    Ok(parse_day_start(s)? + chrono::Duration::days(1))
}

/// Schedule a visit ahead of arrival
#[utoipa::path(
    post,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    request_body = CreateVisit,
    responses(
        (status = 201, description = "Visit scheduled", body = Visit),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Visitor not found")
    )
)]
pub async fn create_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<CreateVisit>,
) -> AppResult<(StatusCode, Json<Visit>)> {
    // Verify the visitor exists before inserting
    state
        .services
        .repository
        .visitors
        .get_by_id(request.visitor_id)
        .await?;

    let visit = state.services.repository.visits.create(&request).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// List visits with filters and pagination
#[utoipa::path(
    get,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "List of visits", body = PaginatedVisits),
        (status = 400, description = "Invalid date format")
    )
)]
pub async fn list_visits(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<PaginatedResponse<Visit>>> {
    let start = query.start_date.as_deref().map(parse_day_start).transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(parse_day_end_exclusive)
        .transpose()?;

    let (visits, total) = state.services.repository.visits.search(&query, start, end).await?;

    Ok(Json(PaginatedResponse {
        items: visits,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Everyone currently on premises
#[utoipa::path(
    get,
    path = "/visits/checked-in",
    tag = "visits",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Currently checked-in visitors", body = Vec<CheckedInEntry>)
    )
)]
pub async fn currently_checked_in(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<CheckedInEntry>>> {
    let entries = state.services.lifecycle.currently_checked_in().await?;
    Ok(Json(entries))
}

/// Close every open visit (evacuation/incident). Idempotent.
#[utoipa::path(
    post,
    path = "/visits/emergency-checkout",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open visits closed", body = EmergencyCheckoutResponse),
        (status = 403, description = "Reception privileges required")
    )
)]
pub async fn emergency_checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<EmergencyCheckoutResponse>> {
    claims.require_reception()?;

    let checkout_count = state
        .services
        .lifecycle
        .emergency_checkout_all(claims.actor())
        .await?;
    Ok(Json(EmergencyCheckoutResponse { checkout_count }))
}

/// Get visit details
#[utoipa::path(
    get,
    path = "/visits/{id}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visit ID")
    ),
    responses(
        (status = 200, description = "Visit details", body = Visit),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn get_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state.services.repository.visits.get_by_id(id).await?;
    Ok(Json(visit))
}

/// Check out one specific visit
#[utoipa::path(
    post,
    path = "/visits/{id}/check-out",
    tag = "lifecycle",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Visit ID")
    ),
    responses(
        (status = 200, description = "Visit checked out", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "Visit is already checked out"),
        (status = 422, description = "Visit was never checked in")
    )
)]
pub async fn check_out_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state
        .services
        .lifecycle
        .check_out(CheckOutTarget::Visit(id), claims.actor())
        .await?;
    Ok(Json(visit))
}
