use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;
use crate::shared::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-scoped errors collected from a whole payload
    #[error("Validation failed: {0}")]
    FieldValidation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A caller used an API wrongly (e.g. an unsupported model type was
    /// handed to a validation rule). Never caused by user input.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::FieldValidation(ref errors) => (
                StatusCode::BAD_REQUEST,
                "The given data was invalid".to_string(),
                Some(errors.messages()),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Convert a database error into a user-facing error where the cause is
/// known (constraint violations), falling back to an opaque database error.
pub fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation (PostgreSQL error code 23505)
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            let constraint = db_err.constraint().unwrap_or_default();
            let (field, message) = if constraint.contains("owner") {
                ("owner", "The record is already attached to an owner.")
            } else if constraint.contains("tuple") {
                ("locations", "The locations field has a duplicate value.")
            } else {
                ("name", "The name has already been taken.")
            };
            return AppError::FieldValidation(FieldErrors::single(field, message));
        }

        // Foreign key violation (PostgreSQL error code 23503)
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::Conflict(
                "Referenced record does not exist or is still referenced by other records."
                    .to_string(),
            );
        }
    }

    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_field_validation_response_lists_every_field() {
        let mut errors = FieldErrors::default();
        errors.add("name", "The name has already been taken.");
        errors.add("country_id", "The selected country does not exist.");

        let response = AppError::FieldValidation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_configuration_error_is_server_error() {
        let response = AppError::Configuration("unsupported model".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_database_sqlx_error_stays_opaque() {
        let err = handle_db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
    }
}
