//! JSON error responses for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::{DbLockError, StoreError};
use crate::services::{GenerationError, ReviewError};
use crate::validation::ValidationError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    /// Internal failure; the detail is logged, not returned
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.message)
    }
}

impl From<DbLockError> for ApiError {
    fn from(err: DbLockError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        Self::internal(format!("database error: {}", err))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found("Flashcard not found"),
            StoreError::StaleSchedule(_) => Self::conflict(err.to_string()),
            StoreError::Lock(lock) => lock.into(),
            StoreError::Sqlite(sql) => sql.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Store(store) => store.into(),
            ReviewError::Schedule(violation) => Self::internal(format!("schedule contract violation: {}", violation)),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::EmptyText | GenerationError::TextTooLong => Self::bad_request(err.to_string()),
            GenerationError::Provider(_) => {
                tracing::error!("{}", err);
                Self::new(StatusCode::BAD_GATEWAY, "GENERATION_FAILED", "Flashcard generation failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleError;

    #[test]
    fn test_store_error_statuses() {
        assert_eq!(ApiError::from(StoreError::NotFound(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::StaleSchedule(1)).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(StoreError::Lock(DbLockError)).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_contract_violation_is_internal() {
        let err = ReviewError::Schedule(ScheduleError::NegativeStability(-1.0));
        let api = ApiError::from(err);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
    }

    #[test]
    fn test_validation_message_is_kept() {
        let api = ApiError::from(ValidationError::new("front", "Front is required"));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Front is required");
    }
}
