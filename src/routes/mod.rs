use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::caller_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    // Caller resolution runs on every request; role checks live in the
    // handlers.
    Router::new()
        .nest("/api/v1", api_routes())
        .layer(middleware::from_fn(caller_middleware))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let public = public_routes(&rate_limit_config);
    let submit = submit_routes(&rate_limit_config);
    let review = review_routes(&rate_limit_config);

    public.merge(submit).merge(review)
}

/// Public reads: listings, search, single entities.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Sites
        .route("/sites", routing::get(handlers::site::list_sites))
        .route("/sites/search", routing::get(handlers::site::search_sites))
        .route("/sites/{id}", routing::get(handlers::site::get_site))
        // Flavors
        .route(
            "/sites/{site_id}/flavors",
            routing::get(handlers::flavor::list_flavors),
        )
        .route("/flavors/{id}", routing::get(handlers::flavor::get_flavor))
        // Benchmarks
        .route(
            "/benchmarks",
            routing::get(handlers::benchmark::list_benchmarks),
        )
        .route(
            "/benchmarks/search",
            routing::get(handlers::benchmark::search_benchmarks),
        )
        .route(
            "/benchmarks/{id}",
            routing::get(handlers::benchmark::get_benchmark),
        )
        // Results
        .route("/results", routing::get(handlers::result::list_results))
        .route("/results/{id}", routing::get(handlers::result::get_result));

    with_optional_rate_limit(router, config.enabled, config.public)
}

/// Authenticated submissions: every create opens a review report.
fn submit_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/sites", routing::post(handlers::site::create_site))
        .route(
            "/sites/{site_id}/flavors",
            routing::post(handlers::flavor::create_flavor),
        )
        .route(
            "/benchmarks",
            routing::post(handlers::benchmark::create_benchmark),
        )
        .route("/results", routing::post(handlers::result::submit_result))
        .route("/reports", routing::post(handlers::report::file_report))
        .route("/users/me", routing::get(handlers::user::get_current_user));

    with_optional_rate_limit(router, config.enabled, config.submit)
}

/// Admin surface: entity edits and the report review workflow.
fn review_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/sites/{id}",
            routing::put(handlers::site::update_site).delete(handlers::site::delete_site),
        )
        .route(
            "/flavors/{id}",
            routing::put(handlers::flavor::update_flavor)
                .delete(handlers::flavor::delete_flavor),
        )
        .route(
            "/benchmarks/{id}",
            routing::put(handlers::benchmark::update_benchmark)
                .delete(handlers::benchmark::delete_benchmark),
        )
        .route(
            "/results/{id}",
            routing::delete(handlers::result::delete_result),
        )
        .route("/reports", routing::get(handlers::report::list_reports))
        .route("/reports/{id}", routing::get(handlers::report::get_report))
        .route(
            "/reports/{id}/resolve",
            routing::post(handlers::report::resolve_report),
        );

    with_optional_rate_limit(router, config.enabled, config.review)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
