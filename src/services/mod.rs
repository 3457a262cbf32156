pub mod benchmark;
pub mod flavor;
pub mod report;
pub mod result;
pub mod site;
pub mod user;

use crate::error::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a unique-constraint violation to a caller-visible conflict.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}
