use crate::error::{AppError, AppResult};
use crate::handlers::report::ReportResponse;
use crate::handlers::site::SearchQuery;
use crate::handlers::split_terms;
use crate::middleware::auth::Caller;
use crate::models::BenchmarkModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::benchmark::{BenchmarkFilter, BenchmarkService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBenchmarkRequest {
    /// Docker image, e.g. "thechristophe/openbench-c-ray"
    #[validate(length(min = 1, max = 256))]
    pub docker_image: String,
    /// Image tag, e.g. "latest" (1-128 characters)
    #[validate(length(min = 1, max = 128))]
    pub docker_tag: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    /// Required-key template submitted results must satisfy
    pub json_template: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBenchmarkRequest {
    #[validate(length(min = 1, max = 256))]
    pub docker_image: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub docker_tag: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    pub json_template: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BenchmarkListQuery {
    pub docker_image: Option<String>,
    pub docker_tag: Option<String>,
    pub uploader_id: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BenchmarkResponse {
    pub id: Uuid,
    pub docker_image: String,
    pub docker_tag: String,
    pub description: Option<String>,
    pub json_template: serde_json::Value,
    pub uploader_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BenchmarkModel> for BenchmarkResponse {
    fn from(b: BenchmarkModel) -> Self {
        Self {
            id: b.id,
            docker_image: b.docker_image,
            docker_tag: b.docker_tag,
            description: b.description,
            json_template: b.json_template,
            uploader_id: b.uploader_id,
            created_at: b.created_at.to_string(),
            updated_at: b.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BenchmarkSubmissionResponse {
    pub benchmark: BenchmarkResponse,
    pub report: ReportResponse,
}

#[utoipa::path(
    get,
    path = "/api/v1/benchmarks",
    params(
        ("docker_image" = Option<String>, Query, description = "Exact image name"),
        ("docker_tag" = Option<String>, Query, description = "Exact tag"),
        ("uploader_id" = Option<String>, Query, description = "Uploader subject"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List benchmarks without open reports", body = PaginatedResponse<BenchmarkResponse>),
    ),
    tag = "benchmarks"
)]
pub async fn list_benchmarks(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<BenchmarkListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };
    let filter = BenchmarkFilter {
        docker_image: params.docker_image,
        docker_tag: params.docker_tag,
        uploader_id: params.uploader_id,
    };

    let service = BenchmarkService::new(db);
    let (benchmarks, total) = service
        .list(filter, pagination.page(), pagination.per_page())
        .await?;
    let items = benchmarks.into_iter().map(BenchmarkResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/benchmarks/search",
    params(
        ("terms" = Option<String>, Query, description = "Space separated substrings"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Benchmarks matching any term", body = PaginatedResponse<BenchmarkResponse>),
    ),
    tag = "benchmarks"
)]
pub async fn search_benchmarks(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };
    let terms = split_terms(params.terms.as_deref());

    let service = BenchmarkService::new(db);
    let (benchmarks, total) = service
        .search(&terms, pagination.page(), pagination.per_page())
        .await?;
    let items = benchmarks.into_iter().map(BenchmarkResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/benchmarks/{id}",
    params(("id" = Uuid, Path, description = "Benchmark ID")),
    responses(
        (status = 200, description = "Benchmark details", body = BenchmarkResponse),
        (status = 404, description = "Benchmark not found", body = AppError),
    ),
    tag = "benchmarks"
)]
pub async fn get_benchmark(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = BenchmarkService::new(db);
    let benchmark = service.get(id).await?;
    Ok(ApiResponse::ok(BenchmarkResponse::from(benchmark)))
}

#[utoipa::path(
    post,
    path = "/api/v1/benchmarks",
    security(("bearer_token" = [])),
    request_body = CreateBenchmarkRequest,
    responses(
        (status = 200, description = "Benchmark created, pending review", body = BenchmarkSubmissionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Authentication required", body = AppError),
        (status = 409, description = "Image and tag pair taken", body = AppError),
    ),
    tag = "benchmarks"
)]
pub async fn create_benchmark(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Json(payload): Json<CreateBenchmarkRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let uploader = caller.require_user()?;

    let service = BenchmarkService::new(db);
    let (benchmark, report) = service
        .create(
            &uploader.id,
            &payload.docker_image,
            &payload.docker_tag,
            payload.description,
            payload.json_template,
        )
        .await?;

    Ok(ApiResponse::ok(BenchmarkSubmissionResponse {
        benchmark: benchmark.into(),
        report: report.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/benchmarks/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Benchmark ID")),
    request_body = UpdateBenchmarkRequest,
    responses(
        (status = 200, description = "Benchmark updated", body = BenchmarkResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Benchmark not found", body = AppError),
    ),
    tag = "benchmarks"
)]
pub async fn update_benchmark(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBenchmarkRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    caller.require_admin()?;

    let service = BenchmarkService::new(db);
    let benchmark = service
        .update(
            id,
            payload.docker_image,
            payload.docker_tag,
            payload.description,
            payload.json_template,
        )
        .await?;

    Ok(ApiResponse::ok(BenchmarkResponse::from(benchmark)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/benchmarks/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Benchmark ID")),
    responses(
        (status = 200, description = "Benchmark deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Benchmark not found", body = AppError),
    ),
    tag = "benchmarks"
)]
pub async fn delete_benchmark(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let service = BenchmarkService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Benchmark deleted"))
}
