use crate::auth::FieldErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of one request, rendered as a JSON `{message}` body
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: FieldErrors,
    },

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    /// The message is what the client sees; the cause stays in the logs
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn internal(message: &'static str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, cause);
        ApiError::Internal(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            ApiError::Validation { message, errors } => json!({ "message": message, "errors": errors }),
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
