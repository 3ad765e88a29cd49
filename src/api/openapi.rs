//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activity, auth, health, stats, users, visitors, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatehouse API",
        version = "1.0.0",
        description = "Visitor Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Visitors
        visitors::register,
        visitors::create_visitor,
        visitors::list_visitors,
        visitors::pending_approvals,
        visitors::get_visitor,
        visitors::update_visitor,
        visitors::delete_visitor,
        visitors::approve_visitor,
        visitors::reject_visitor,
        visitors::check_in_visitor,
        visitors::check_out_visitor,
        // Visits
        visits::create_visit,
        visits::list_visits,
        visits::currently_checked_in,
        visits::emergency_checkout,
        visits::get_visit,
        visits::check_out_visit,
        // Users
        users::list_hosts,
        users::list_users,
        users::create_user,
        // Stats
        stats::get_stats,
        // Activity
        activity::recent_activity,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Visitors
            crate::models::visitor::Visitor,
            crate::models::visitor::VisitorSummary,
            crate::models::visitor::VisitorWithHost,
            crate::models::visitor::VisitorStatus,
            crate::models::visitor::CreateVisitor,
            crate::models::visitor::UpdateVisitor,
            visitors::RejectRequest,
            // Visits
            crate::models::visit::Visit,
            crate::models::visit::CreateVisit,
            crate::models::visit::CheckInRequest,
            crate::models::visit::CheckedInEntry,
            crate::models::visit::EmergencyCheckoutResponse,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::HostSummary,
            // Activity
            crate::models::activity::ActivityEntry,
            crate::models::activity::ActivityAction,
            // Stats
            crate::services::stats::DashboardStats,
            stats::StatsQuery,
            // Pagination
            crate::api::PaginatedVisitors,
            crate::api::PaginatedVisits,
            crate::api::PaginatedUsers,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "visitors", description = "Visitor registration and management"),
        (name = "visits", description = "Visit scheduling and on-site presence"),
        (name = "lifecycle", description = "Approval, check-in and check-out operations"),
        (name = "users", description = "Staff and host management"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "activity", description = "Audit trail")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
