//! Statistics endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, services::stats::DashboardStats};

use super::AuthenticatedUser;

/// Query parameters for dashboard statistics
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    /// Scope counters to visits assigned to this host
    pub host_id: Option<i32>,
}

/// Front-desk dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(StatsQuery),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard(query.host_id).await?;
    Ok(Json(stats))
}
