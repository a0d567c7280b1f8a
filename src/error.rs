use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors surfaced by the ranking engine and its collaborators
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),

    #[error("Concurrent update conflict: {0}")]
    ConcurrentUpdateConflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RankError>;

// SQLSTATE codes Postgres raises when a transaction lost a race
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const UNIQUE_VIOLATION: &str = "23505";

impl RankError {
    /// Short machine-readable kind, used as the `error` field of responses
    pub fn kind(&self) -> &'static str {
        match self {
            RankError::NotFound(_) => "not_found",
            RankError::InvalidComparison(_) => "invalid_comparison",
            RankError::ConcurrentUpdateConflict(_) => "concurrent_update_conflict",
            RankError::StoreUnavailable(_) => "store_unavailable",
            RankError::Validation(_) => "validation_failed",
            RankError::Config(_) => "configuration_error",
        }
    }

    /// Errors that a fresh read of the rankings can clear
    pub fn is_retryable(&self) -> bool {
        matches!(self, RankError::ConcurrentUpdateConflict(_))
    }
}

impl From<sqlx::Error> for RankError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RankError::NotFound(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) | Some(LOCK_NOT_AVAILABLE)
                | Some(UNIQUE_VIOLATION) => RankError::ConcurrentUpdateConflict(db.message().to_string()),
                _ => RankError::StoreUnavailable(err.to_string()),
            },
            _ => RankError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RankError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RankError::StoreUnavailable(format!("migration failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for RankError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RankError::Validation(errors.to_string())
    }
}

impl ResponseError for RankError {
    fn status_code(&self) -> StatusCode {
        match self {
            RankError::NotFound(_) => StatusCode::NOT_FOUND,
            RankError::InvalidComparison(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RankError::ConcurrentUpdateConflict(_) => StatusCode::CONFLICT,
            RankError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RankError::Validation(_) => StatusCode::BAD_REQUEST,
            RankError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RankError::NotFound("u1".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RankError::InvalidComparison("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            RankError::ConcurrentUpdateConflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RankError::StoreUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RankError::ConcurrentUpdateConflict("x".into()).is_retryable());
        assert!(!RankError::StoreUnavailable("x".into()).is_retryable());
        assert!(!RankError::InvalidComparison("x".into()).is_retryable());
        assert!(!RankError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err: RankError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), "not_found");

        let err: RankError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), "store_unavailable");
    }
}
