use crate::error::{AppError, AppResult};
use crate::middleware::auth::Caller;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::UserService;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_admin: u.is_admin,
            created_at: u.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "The calling user's record", body = UserResponse),
        (status = 401, description = "Authentication required", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    caller: Caller,
) -> AppResult<impl IntoResponse> {
    let identity = caller.require_user()?;

    let service = UserService::new(db);
    let user = service.get(&identity.id).await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}
