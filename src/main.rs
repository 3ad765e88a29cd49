//! Gatehouse Server - Visitor Management System
//!
//! A Rust REST API server for visitor registration, approval and
//! on-site presence tracking.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{clock::SystemClock, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("gatehouse_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gatehouse Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), Arc::new(SystemClock));

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Rate limit the unauthenticated kiosk endpoint per client IP
    let governor_conf = Box::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.registration.per_seconds)
            .burst_size(state.config.registration.burst_size)
            .finish()
            .expect("Invalid rate limit configuration"),
    );

    let public = Router::new()
        .route("/public/register", post(api::visitors::register))
        .layer(GovernorLayer {
            config: Box::leak(governor_conf),
        })
        .with_state(state.clone());

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Visitors
        .route("/visitors", get(api::visitors::list_visitors))
        .route("/visitors", post(api::visitors::create_visitor))
        .route("/visitors/pending", get(api::visitors::pending_approvals))
        .route("/visitors/:id", get(api::visitors::get_visitor))
        .route("/visitors/:id", put(api::visitors::update_visitor))
        .route("/visitors/:id", delete(api::visitors::delete_visitor))
        .route("/visitors/:id/approve", post(api::visitors::approve_visitor))
        .route("/visitors/:id/reject", post(api::visitors::reject_visitor))
        .route("/visitors/:id/check-in", post(api::visitors::check_in_visitor))
        .route("/visitors/:id/check-out", post(api::visitors::check_out_visitor))
        // Visits
        .route("/visits", get(api::visits::list_visits))
        .route("/visits", post(api::visits::create_visit))
        .route("/visits/checked-in", get(api::visits::currently_checked_in))
        .route(
            "/visits/emergency-checkout",
            post(api::visits::emergency_checkout),
        )
        .route("/visits/:id", get(api::visits::get_visit))
        .route("/visits/:id/check-out", post(api::visits::check_out_visit))
        // Users and hosts
        .route("/hosts", get(api::users::list_hosts))
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        // Activity feed
        .route("/activity", get(api::activity::recent_activity))
        .with_state(state)
        .merge(public);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
