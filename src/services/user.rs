use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr};

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: &str) -> AppResult<UserModel> {
        User::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create the user row on first authenticated action. Idempotent:
    /// later calls return the existing row, and a concurrent first
    /// action losing the insert race falls back to the winner's row.
    pub async fn ensure_exists(&self, id: &str, email: &str) -> AppResult<UserModel> {
        if let Some(existing) = User::find_by_id(id.to_owned()).one(&self.db).await? {
            return Ok(existing);
        }

        let new_user = user::ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            is_admin: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        match new_user.insert(&self.db).await {
            Ok(created) => {
                tracing::info!("Created user record for subject '{}'", id);
                Ok(created)
            }
            Err(err) if is_unique_violation(&err) => User::find_by_id(id.to_owned())
                .one(&self.db)
                .await?
                .ok_or(AppError::Database(err)),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
