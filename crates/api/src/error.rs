//! JSON error responses.
//!
//! Every handler failure is an [`AppError`] underneath. Server-side errors
//! are logged here and reach the client only as a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use tally_core::auth::PasswordError;
use tally_core::operation::FilterError;
use tally_db::repositories::{AccountError, OperationError};
use tally_shared::{AppError, JwtError};
use tracing::error;
use validator::ValidationErrors;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by handlers, rendered as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 404 for a missing (or foreign) resource.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self(AppError::NotFound(format!("{what} not found")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            error!(error = %err, "Request failed");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": err.error_code(),
            "message": err.public_message(),
        }));
        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
            return Self(AppError::Conflict(detail));
        }
        Self(AppError::Database(e.to_string()))
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        Self(e.into())
    }
}

impl From<OperationError> for ApiError {
    fn from(e: OperationError) -> Self {
        Self(e.into())
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        Self(AppError::Validation(e.to_string()))
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self(AppError::Validation(e.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self(AppError::Validation(e.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self(AppError::Validation(e.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self(AppError::Validation(e.body_text()))
    }
}
