use crate::error::{AppError, AppResult};
use crate::handlers::report::ReportResponse;
use crate::middleware::auth::Caller;
use crate::models::BenchResultModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::result::{ResultFilter, ResultService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResultListQuery {
    pub benchmark_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub flavor_id: Option<Uuid>,
    pub uploader_id: Option<String>,
    /// Only results uploaded strictly before this instant
    pub upload_before: Option<NaiveDateTime>,
    /// Only results uploaded strictly after this instant
    pub upload_after: Option<NaiveDateTime>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Execution context of a submitted result. The document itself is the
/// request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitResultQuery {
    pub benchmark_id: Uuid,
    pub site_id: Uuid,
    pub flavor_id: Uuid,
    pub execution_datetime: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultResponse {
    pub id: Uuid,
    pub benchmark_id: Uuid,
    pub site_id: Uuid,
    pub flavor_id: Uuid,
    pub execution_datetime: String,
    pub json: serde_json::Value,
    pub uploader_id: String,
    pub created_at: String,
}

impl From<BenchResultModel> for ResultResponse {
    fn from(r: BenchResultModel) -> Self {
        Self {
            id: r.id,
            benchmark_id: r.benchmark_id,
            site_id: r.site_id,
            flavor_id: r.flavor_id,
            execution_datetime: r.execution_datetime.to_string(),
            json: r.json,
            uploader_id: r.uploader_id,
            created_at: r.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultSubmissionResponse {
    pub result: ResultResponse,
    pub report: ReportResponse,
}

#[utoipa::path(
    get,
    path = "/api/v1/results",
    params(
        ("benchmark_id" = Option<Uuid>, Query, description = "Benchmark filter"),
        ("site_id" = Option<Uuid>, Query, description = "Site filter"),
        ("flavor_id" = Option<Uuid>, Query, description = "Flavor filter"),
        ("uploader_id" = Option<String>, Query, description = "Uploader subject"),
        ("upload_before" = Option<String>, Query, description = "Uploaded before (ISO timestamp)"),
        ("upload_after" = Option<String>, Query, description = "Uploaded after (ISO timestamp)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List results without open reports", body = PaginatedResponse<ResultResponse>),
    ),
    tag = "results"
)]
pub async fn list_results(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ResultListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };
    let filter = ResultFilter {
        benchmark_id: params.benchmark_id,
        site_id: params.site_id,
        flavor_id: params.flavor_id,
        uploader_id: params.uploader_id,
        upload_before: params.upload_before,
        upload_after: params.upload_after,
    };

    let service = ResultService::new(db);
    let (results, total) = service
        .list(filter, pagination.page(), pagination.per_page())
        .await?;
    let items = results.into_iter().map(ResultResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result details", body = ResultResponse),
        (status = 404, description = "Result not found", body = AppError),
    ),
    tag = "results"
)]
pub async fn get_result(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ResultService::new(db);
    let result = service.get(id).await?;
    Ok(ApiResponse::ok(ResultResponse::from(result)))
}

#[utoipa::path(
    post,
    path = "/api/v1/results",
    security(("bearer_token" = [])),
    params(
        ("benchmark_id" = Uuid, Query, description = "Benchmark the result was produced by"),
        ("site_id" = Uuid, Query, description = "Site the run executed on"),
        ("flavor_id" = Uuid, Query, description = "Flavor the run executed on"),
        ("execution_datetime" = String, Query, description = "When the run executed (ISO timestamp)"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Result stored, pending review", body = ResultSubmissionResponse),
        (status = 400, description = "Document fails the benchmark template", body = AppError),
        (status = 401, description = "Authentication required", body = AppError),
        (status = 404, description = "Unknown benchmark, site or flavor", body = AppError),
    ),
    tag = "results"
)]
pub async fn submit_result(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Query(params): Query<SubmitResultQuery>,
    Json(document): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let uploader = caller.require_user()?;

    let service = ResultService::new(db);
    let (result, report) = service
        .submit(
            &uploader.id,
            params.benchmark_id,
            params.site_id,
            params.flavor_id,
            params.execution_datetime,
            document,
        )
        .await?;

    Ok(ApiResponse::ok(ResultSubmissionResponse {
        result: result.into(),
        report: report.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/results/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Result not found", body = AppError),
    ),
    tag = "results"
)]
pub async fn delete_result(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let service = ResultService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Result deleted"))
}
