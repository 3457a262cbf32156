use crate::error::{AppError, AppResult};
use crate::handlers::report::ReportResponse;
use crate::handlers::split_terms;
use crate::middleware::auth::Caller;
use crate::models::SiteModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::site::{SiteFilter, SiteService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSiteRequest {
    /// Unique handle, e.g. "fzj-juwels" (1-64 characters)
    #[validate(length(min = 1, max = 64))]
    pub short_name: String,
    /// Human readable name (1-128 characters)
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Physical or organisational address (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub address: String,
    /// Free-form description
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSiteRequest {
    #[validate(length(min = 1, max = 64))]
    pub short_name: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub address: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SiteListQuery {
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub uploader_id: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// Space separated search terms
    pub terms: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SiteResponse {
    pub id: Uuid,
    pub short_name: String,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub uploader_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SiteModel> for SiteResponse {
    fn from(s: SiteModel) -> Self {
        Self {
            id: s.id,
            short_name: s.short_name,
            name: s.name,
            address: s.address,
            description: s.description,
            uploader_id: s.uploader_id,
            created_at: s.created_at.to_string(),
            updated_at: s.updated_at.to_string(),
        }
    }
}

/// A freshly submitted site together with the report that gates it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SiteSubmissionResponse {
    pub site: SiteResponse,
    pub report: ReportResponse,
}

#[utoipa::path(
    get,
    path = "/api/v1/sites",
    params(
        ("short_name" = Option<String>, Query, description = "Exact short name"),
        ("name" = Option<String>, Query, description = "Exact name"),
        ("uploader_id" = Option<String>, Query, description = "Uploader subject"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List sites without open reports", body = PaginatedResponse<SiteResponse>),
    ),
    tag = "sites"
)]
pub async fn list_sites(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SiteListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };
    let filter = SiteFilter {
        short_name: params.short_name,
        name: params.name,
        uploader_id: params.uploader_id,
    };

    let service = SiteService::new(db);
    let (sites, total) = service
        .list(filter, pagination.page(), pagination.per_page())
        .await?;
    let items = sites.into_iter().map(SiteResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/sites/search",
    params(
        ("terms" = Option<String>, Query, description = "Space separated substrings"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Sites matching any term", body = PaginatedResponse<SiteResponse>),
    ),
    tag = "sites"
)]
pub async fn search_sites(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };
    let terms = split_terms(params.terms.as_deref());

    let service = SiteService::new(db);
    let (sites, total) = service
        .search(&terms, pagination.page(), pagination.per_page())
        .await?;
    let items = sites.into_iter().map(SiteResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/sites/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site details", body = SiteResponse),
        (status = 404, description = "Site not found", body = AppError),
    ),
    tag = "sites"
)]
pub async fn get_site(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SiteService::new(db);
    let site = service.get(id).await?;
    Ok(ApiResponse::ok(SiteResponse::from(site)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sites",
    security(("bearer_token" = [])),
    request_body = CreateSiteRequest,
    responses(
        (status = 200, description = "Site created, pending review", body = SiteSubmissionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Authentication required", body = AppError),
        (status = 409, description = "Short name taken", body = AppError),
    ),
    tag = "sites"
)]
pub async fn create_site(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Json(payload): Json<CreateSiteRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let uploader = caller.require_user()?;

    let service = SiteService::new(db);
    let (site, report) = service
        .create(
            &uploader.id,
            &payload.short_name,
            &payload.name,
            &payload.address,
            payload.description,
        )
        .await?;

    Ok(ApiResponse::ok(SiteSubmissionResponse {
        site: site.into(),
        report: report.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/sites/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = UpdateSiteRequest,
    responses(
        (status = 200, description = "Site updated", body = SiteResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Site not found", body = AppError),
    ),
    tag = "sites"
)]
pub async fn update_site(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSiteRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    caller.require_admin()?;

    let service = SiteService::new(db);
    let site = service
        .update(
            id,
            payload.short_name,
            payload.name,
            payload.address,
            payload.description,
        )
        .await?;

    Ok(ApiResponse::ok(SiteResponse::from(site)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sites/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Site not found", body = AppError),
    ),
    tag = "sites"
)]
pub async fn delete_site(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let service = SiteService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Site deleted"))
}
