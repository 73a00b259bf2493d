//! Events Planner Server
//!
//! REST API server for church event planning and visitor reporting.

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use events_planner::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Events Planner v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    if config.nextcloud.base_url.is_none() {
        tracing::warn!("Nextcloud is not configured, file sharing endpoints will fail");
    }

    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, &config);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Pretty or JSON output, filtered by `RUST_LOG` or the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("events_planner={},tower_http=debug", logging.level).into());

    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Events
        .route("/events", get(api::events::list_events))
        .route("/events", post(api::events::create_event))
        .route("/events/tree", get(api::events::event_tree))
        .route("/events/:id", get(api::events::get_event))
        .route("/events/:id", put(api::events::update_event))
        .route("/events/:id", delete(api::events::delete_event))
        .route("/events/:id/attachment", post(api::events::upload_attachment))
        .route("/mobile-visitors/events", get(api::events::list_events_for_welcome))
        // Categories
        .route("/categories", get(api::categories::list_categories))
        .route("/categories", post(api::categories::create_category))
        .route("/categories/:id", get(api::categories::get_category))
        .route("/categories/:id", put(api::categories::update_category))
        .route("/categories/:id", delete(api::categories::delete_category))
        // Planning levels
        .route("/planning-levels", get(api::planning_levels::list_planning_levels))
        .route("/planning-levels", post(api::planning_levels::create_planning_level))
        .route("/planning-levels/:id", get(api::planning_levels::get_planning_level))
        .route("/planning-levels/:id", put(api::planning_levels::update_planning_level))
        .route("/planning-levels/:id", delete(api::planning_levels::delete_planning_level))
        // Reporting
        .route("/reporting", post(api::reporting::submit_reporting))
        .route("/reporting/manual", post(api::reporting::submit_reporting_manual))
        .route("/reporting/by-event/:event_id", get(api::reporting::list_for_event))
        .route("/reporting/:id", put(api::reporting::update_reporting))
        .route("/reporting/:id", delete(api::reporting::delete_reporting))
        .route("/reports/visitors-by-title", get(api::reporting::visitors_by_title))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/:id", put(api::users::update_user))
        // Nextcloud
        .route(
            "/nextcloud/predigtreihe-attachment",
            post(api::nextcloud::upload_sermon_series_attachment),
        )
        .route("/nextcloud/bauspende-copy", post(api::nextcloud::copy_and_share))
        .route("/nextcloud/gottesdienst-folder", post(api::nextcloud::service_folder))
        // Attachments and sermon series uploads
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .route("/", get(api::health::root))
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
