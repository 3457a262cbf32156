#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static SUBJECT_COUNTER: AtomicUsize = AtomicUsize::new(0);
static SITE_COUNTER: AtomicUsize = AtomicUsize::new(0);

const TEST_JWT_SECRET: &str = "integration_test_secret_that_is_at_least_32_characters_long";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = perf_catalog::config::jwt::JwtConfig::from_env().unwrap();
        let _ = perf_catalog::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        perf_catalog::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order)
    cleanup_tables(&db).await;

    let auth_config = perf_catalog::config::auth::AuthConfig::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(perf_catalog::routes::create_routes())
        .layer(axum::middleware::from_fn(
            perf_catalog::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(auth_config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = ["reports", "results", "flavors", "benchmarks", "sites", "users"];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

#[derive(serde::Serialize)]
struct TestClaims {
    sub: String,
    email: String,
    exp: usize,
}

/// Mint a bearer token the way the identity provider would.
pub fn issue_token(subject: &str, email: &str) -> String {
    let claims = TestClaims {
        sub: subject.to_string(),
        email: email.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token")
}

/// Mint a token for a fresh subject and force the lazy user creation by
/// touching an authenticated endpoint. Returns (subject, token).
pub async fn create_test_user(app: &TestApp, prefix: &str) -> (String, String) {
    let counter = SUBJECT_COUNTER.fetch_add(1, Ordering::SeqCst);
    let subject = format!("{}_{}", prefix, counter);
    let token = issue_token(&subject, &format!("{}@test.org", subject));

    let resp = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to call /users/me");
    assert_eq!(resp.status(), 200, "Lazy user creation failed");

    (subject, token)
}

/// Flip the stored admin flag for a subject.
pub async fn make_admin(db: &DatabaseConnection, subject: &str) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET is_admin = TRUE WHERE id = $1",
        vec![subject.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// Create a site and return (site_id, report_id).
pub async fn create_test_site(app: &TestApp, token: &str) -> (String, String) {
    let counter = SITE_COUNTER.fetch_add(1, Ordering::SeqCst);

    let resp = app
        .client
        .post(app.url("/sites"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "short_name": format!("site-{}", counter),
            "name": format!("Test Site {}", counter),
            "address": "Wilhelm-Johnen-Strasse 1",
            "description": "A site used by the integration tests"
        }))
        .send()
        .await
        .expect("Failed to create site");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse site response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create site: status={}, body={}", status, body);
    }

    (
        body["data"]["site"]["id"].as_str().unwrap().to_string(),
        body["data"]["report"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a flavor under a site and return (flavor_id, report_id).
pub async fn create_test_flavor(app: &TestApp, token: &str, site_id: &str, name: &str) -> (String, String) {
    let resp = app
        .client
        .post(app.url(&format!("/sites/{}/flavors", site_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "name": name,
            "description": "2x AMD EPYC 7763, 512 GiB"
        }))
        .send()
        .await
        .expect("Failed to create flavor");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse flavor response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create flavor: status={}, body={}", status, body);
    }

    (
        body["data"]["flavor"]["id"].as_str().unwrap().to_string(),
        body["data"]["report"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a benchmark and return (benchmark_id, report_id).
pub async fn create_test_benchmark(
    app: &TestApp,
    token: &str,
    image: &str,
    tag: &str,
    template: Value,
) -> (String, String) {
    let resp = app
        .client
        .post(app.url("/benchmarks"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "docker_image": image,
            "docker_tag": tag,
            "description": "An integration test benchmark",
            "json_template": template
        }))
        .send()
        .await
        .expect("Failed to create benchmark");

    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .expect("Failed to parse benchmark response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create benchmark: status={}, body={}", status, body);
    }

    (
        body["data"]["benchmark"]["id"].as_str().unwrap().to_string(),
        body["data"]["report"]["id"].as_str().unwrap().to_string(),
    )
}

/// Approve a report as the given admin.
pub async fn approve_report(app: &TestApp, admin_token: &str, report_id: &str) {
    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({ "action": "approve" }))
        .send()
        .await
        .expect("Failed to resolve report");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse resolve response");
    if status != 200 {
        panic!("Failed to approve report: status={}, body={}", status, body);
    }
}
