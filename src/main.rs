mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Site routes
        crate::handlers::site::list_sites,
        crate::handlers::site::search_sites,
        crate::handlers::site::get_site,
        crate::handlers::site::create_site,
        crate::handlers::site::update_site,
        crate::handlers::site::delete_site,
        // Flavor routes
        crate::handlers::flavor::list_flavors,
        crate::handlers::flavor::get_flavor,
        crate::handlers::flavor::create_flavor,
        crate::handlers::flavor::update_flavor,
        crate::handlers::flavor::delete_flavor,
        // Benchmark routes
        crate::handlers::benchmark::list_benchmarks,
        crate::handlers::benchmark::search_benchmarks,
        crate::handlers::benchmark::get_benchmark,
        crate::handlers::benchmark::create_benchmark,
        crate::handlers::benchmark::update_benchmark,
        crate::handlers::benchmark::delete_benchmark,
        // Result routes
        crate::handlers::result::list_results,
        crate::handlers::result::get_result,
        crate::handlers::result::submit_result,
        crate::handlers::result::delete_result,
        // Report routes
        crate::handlers::report::file_report,
        crate::handlers::report::list_reports,
        crate::handlers::report::get_report,
        crate::handlers::report::resolve_report,
        // User routes
        crate::handlers::user::get_current_user,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            // Sites
            crate::handlers::site::CreateSiteRequest,
            crate::handlers::site::UpdateSiteRequest,
            crate::handlers::site::SiteResponse,
            crate::handlers::site::SiteSubmissionResponse,
            // Flavors
            crate::handlers::flavor::CreateFlavorRequest,
            crate::handlers::flavor::UpdateFlavorRequest,
            crate::handlers::flavor::FlavorResponse,
            crate::handlers::flavor::FlavorSubmissionResponse,
            // Benchmarks
            crate::handlers::benchmark::CreateBenchmarkRequest,
            crate::handlers::benchmark::UpdateBenchmarkRequest,
            crate::handlers::benchmark::BenchmarkResponse,
            crate::handlers::benchmark::BenchmarkSubmissionResponse,
            // Results
            crate::handlers::result::ResultResponse,
            crate::handlers::result::ResultSubmissionResponse,
            // Reports
            crate::handlers::report::FileReportRequest,
            crate::handlers::report::ResolveReportRequest,
            crate::handlers::report::ReportResponse,
            // Users
            crate::handlers::user::UserResponse,
            // Enums
            crate::models::ResourceType,
            crate::models::Resolution,
        )
    ),
    tags(
        (name = "sites", description = "Compute site catalogue"),
        (name = "flavors", description = "Hardware flavors per site"),
        (name = "benchmarks", description = "Benchmark definitions"),
        (name = "results", description = "Benchmark result submissions"),
        (name = "reports", description = "Moderation and review workflow"),
        (name = "users", description = "User identity"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perf_catalog=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Benchmark Catalogue API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let auth_config = config::auth::AuthConfig::from_env();

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(auth_config));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Benchmark Catalogue API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
