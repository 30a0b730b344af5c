//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Schema validation failure, surfaced per field
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authorization failure or invalid/expired verification token
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Blob or persistent-store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catch-all, surfaced with message and logged
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Unexpected(err.to_string())
    }
}

impl ApiError {
    /// Wrap a repository failure, classifying unique-constraint violations
    /// as `Conflict` and everything else as `Storage`.
    pub fn from_db(err: anyhow::Error, conflict_message: &str) -> Self {
        if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(conflict_message.to_string());
            }
        }
        ApiError::Storage(err.to_string())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(fields) => {
                let mut errors = serde_json::Map::new();
                for f in &fields {
                    errors.insert(f.field.to_string(), json!(f.message));
                }
                (StatusCode::BAD_REQUEST, json!({ "errors": errors }))
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Storage error" }),
                )
            }
            ApiError::Unexpected(message) => {
                tracing::error!("Unexpected error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred", "message": message }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        let err = ApiError::validation("email", "Invalid email format");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::Forbidden("nope".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::NotFound("missing".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("duplicate".into()),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Storage("disk on fire".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn non_unique_db_error_is_storage() {
        let err = ApiError::from_db(anyhow::anyhow!("connection reset"), "duplicate");
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
