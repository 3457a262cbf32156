use crate::error::{AppError, AppResult};
use crate::handlers::report::ReportResponse;
use crate::middleware::auth::Caller;
use crate::models::FlavorModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::flavor::FlavorService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFlavorRequest {
    /// Flavor name as advertised by the site (1-128 characters)
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFlavorRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FlavorListQuery {
    pub name: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlavorResponse {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub uploader_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FlavorModel> for FlavorResponse {
    fn from(f: FlavorModel) -> Self {
        Self {
            id: f.id,
            site_id: f.site_id,
            name: f.name,
            description: f.description,
            uploader_id: f.uploader_id,
            created_at: f.created_at.to_string(),
            updated_at: f.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlavorSubmissionResponse {
    pub flavor: FlavorResponse,
    pub report: ReportResponse,
}

#[utoipa::path(
    get,
    path = "/api/v1/sites/{site_id}/flavors",
    params(
        ("site_id" = Uuid, Path, description = "Owning site"),
        ("name" = Option<String>, Query, description = "Exact flavor name"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Flavors of the site", body = PaginatedResponse<FlavorResponse>),
        (status = 404, description = "Site not found", body = AppError),
    ),
    tag = "flavors"
)]
pub async fn list_flavors(
    Extension(db): Extension<DatabaseConnection>,
    Path(site_id): Path<Uuid>,
    Query(params): Query<FlavorListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    };

    let service = FlavorService::new(db);
    let (flavors, total) = service
        .list_for_site(site_id, params.name, pagination.page(), pagination.per_page())
        .await?;
    let items = flavors.into_iter().map(FlavorResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items,
        total,
        pagination.page(),
        pagination.per_page(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/flavors/{id}",
    params(("id" = Uuid, Path, description = "Flavor ID")),
    responses(
        (status = 200, description = "Flavor details", body = FlavorResponse),
        (status = 404, description = "Flavor not found", body = AppError),
    ),
    tag = "flavors"
)]
pub async fn get_flavor(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = FlavorService::new(db);
    let flavor = service.get(id).await?;
    Ok(ApiResponse::ok(FlavorResponse::from(flavor)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sites/{site_id}/flavors",
    security(("bearer_token" = [])),
    params(("site_id" = Uuid, Path, description = "Owning site")),
    request_body = CreateFlavorRequest,
    responses(
        (status = 200, description = "Flavor created, pending review", body = FlavorSubmissionResponse),
        (status = 401, description = "Authentication required", body = AppError),
        (status = 404, description = "Site not found", body = AppError),
        (status = 409, description = "Flavor name taken on this site", body = AppError),
    ),
    tag = "flavors"
)]
pub async fn create_flavor(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<CreateFlavorRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let uploader = caller.require_user()?;

    let service = FlavorService::new(db);
    let (flavor, report) = service
        .create(&uploader.id, site_id, &payload.name, payload.description)
        .await?;

    Ok(ApiResponse::ok(FlavorSubmissionResponse {
        flavor: flavor.into(),
        report: report.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/flavors/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Flavor ID")),
    request_body = UpdateFlavorRequest,
    responses(
        (status = 200, description = "Flavor updated", body = FlavorResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Flavor not found", body = AppError),
    ),
    tag = "flavors"
)]
pub async fn update_flavor(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlavorRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    caller.require_admin()?;

    let service = FlavorService::new(db);
    let flavor = service.update(id, payload.name, payload.description).await?;

    Ok(ApiResponse::ok(FlavorResponse::from(flavor)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/flavors/{id}",
    security(("bearer_token" = [])),
    params(("id" = Uuid, Path, description = "Flavor ID")),
    responses(
        (status = 200, description = "Flavor deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Flavor not found", body = AppError),
    ),
    tag = "flavors"
)]
pub async fn delete_flavor(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    caller.require_admin()?;

    let service = FlavorService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Flavor deleted"))
}
