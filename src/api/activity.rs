//! Activity feed endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::activity::{ActivityEntry, ActivityQuery},
};

use super::AuthenticatedUser;

/// Recent audit entries, newest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity", body = Vec<ActivityEntry>)
    )
)]
pub async fn recent_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let entries = state.services.repository.activity.recent(&query).await?;
    Ok(Json(entries))
}
