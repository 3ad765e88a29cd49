//! Visit (attendance) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::HostSummary;
use super::visitor::VisitorSummary;

/// Visit model from database
///
/// One dated attendance record for a visitor, distinct from the visitor's
/// persistent profile. `check_out_time` may only be set once `check_in_time`
/// is, and a visitor has at most one visit with check-in set and check-out
/// unset at any time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: i32,
    pub visitor_id: i32,
    pub host_id: Option<i32>,
    pub visit_date: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Badge issued at check-in, format BADGE-XXXXXXXX
    pub badge_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create visit request (scheduled ahead of arrival)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVisit {
    pub visitor_id: i32,
    pub host_id: Option<i32>,
    /// Planned date and time of the visit
    pub visit_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Check-in command
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// Existing visit to check in against; today's visit is found or created
    /// when omitted
    pub visit_id: Option<i32>,
    /// Pre-printed badge to assign; one is generated when omitted
    pub badge_number: Option<String>,
}

/// Visit query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    /// Start of the visit_date range (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// End of the visit_date range (YYYY-MM-DD, inclusive)
    pub end_date: Option<String>,
    pub visitor_id: Option<i32>,
    pub host_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Currently-checked-in dashboard entry
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckedInEntry {
    pub visit_id: i32,
    pub visitor: VisitorSummary,
    pub host: Option<HostSummary>,
    pub checked_in_at: DateTime<Utc>,
    pub badge_number: Option<String>,
    /// Time on premises so far, e.g. "2h 5m"
    pub duration: String,
}

/// Emergency checkout result
#[derive(Debug, Serialize, ToSchema)]
pub struct EmergencyCheckoutResponse {
    /// Number of visits closed by this call
    pub checkout_count: u64,
}
