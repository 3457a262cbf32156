use crate::error::{AppError, AppResult};
use crate::middleware::auth::Caller;
use crate::models::{ReportModel, Resolution, ResourceType};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::report::ReportService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FileReportRequest {
    /// Kind of the reported entity
    pub resource_type: ResourceType,
    /// ID of the reported entity
    pub resource_id: Uuid,
    /// Why the entity is being reported
    #[validate(length(min = 1, max = 2048))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Restrict to unresolved reports
    pub only_unanswered: Option<bool>,
    /// Restrict to one entity kind
    pub resource_type: Option<ResourceType>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveReportRequest {
    /// Verdict: "approve" or "reject"
    #[validate(length(min = 1, max = 16))]
    pub action: String,
}

impl ResolveReportRequest {
    pub fn approve(&self) -> AppResult<bool> {
        match self.action.as_str() {
            "approve" => Ok(true),
            "reject" => Ok(false),
            other => Err(AppError::Validation(format!(
                "action must be 'approve' or 'reject', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: Uuid,
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    pub reporter_id: String,
    pub message: Option<String>,
    pub resolution: Resolution,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

impl From<ReportModel> for ReportResponse {
    fn from(r: ReportModel) -> Self {
        Self {
            id: r.id,
            resource_type: r.resource_type,
            resource_id: r.resource_id,
            reporter_id: r.reporter_id,
            message: r.message,
            resolution: r.resolution,
            resolved_by: r.resolved_by,
            resolved_at: r.resolved_at.map(|t| t.to_string()),
            created_at: r.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("bearer_token" = [])),
    request_body = FileReportRequest,
    responses(
        (status = 200, description = "Report filed", body = ReportResponse),
        (status = 401, description = "Authentication required", body = AppError),
        (status = 404, description = "Reported entity not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn file_report(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Json(payload): Json<FileReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reporter = caller.require_user()?;

    let service = ReportService::new(db);
    let report = service
        .file(
            &reporter.id,
            payload.resource_type,
            payload.resource_id,
            payload.message,
        )
        .await?;

    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    security(("bearer_token" = [])),
    params(
        ("only_unanswered" = Option<bool>, Query, description = "Restrict to unresolved reports"),
        ("resource_type" = Option<String>, Query, description = "SITE, FLAVOR, BENCHMARK or RESULT"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reports, oldest first", body = PaginatedResponse<ReportResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };

    let service = ReportService::new(db);
    let (reports, total) = service
        .list(
            params.only_unanswered.unwrap_or(false),
            params.resource_type,
            pagination.page(),
            pagination.per_page(),
        )
        .await?;
    let items = reports.into_iter().map(ReportResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report details", body = ReportResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn get_report(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let service = ReportService::new(db);
    let report = service.get(id).await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports/{id}/resolve",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = ResolveReportRequest,
    responses(
        (status = 200, description = "Report resolved", body = ReportResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Already resolved", body = AppError),
    ),
    tag = "reports"
)]
pub async fn resolve_report(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let approve = payload.approve()?;

    let admin = caller.require_admin()?;

    let service = ReportService::new(db);
    let report = service.resolve(id, approve, &admin.id).await?;

    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_action_parsing() {
        let approve = ResolveReportRequest {
            action: "approve".to_string(),
        };
        assert!(approve.approve().unwrap());

        let reject = ResolveReportRequest {
            action: "reject".to_string(),
        };
        assert!(!reject.approve().unwrap());

        let bogus = ResolveReportRequest {
            action: "dismiss".to_string(),
        };
        assert!(matches!(bogus.approve(), Err(AppError::Validation(_))));
    }
}
