//! API error responses.

use crate::error::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body returned by every failing endpoint.
///
/// Both upload conflicts answer 409; `status` tells them apart
/// (`already_exists` or `old_data`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: String,
    pub code: u16,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", 400, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", 401, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", 404, message)
    }

    #[must_use]
    pub fn conflict(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(status, 409, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", 500, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserExists => ApiError::conflict("user_exists", e.to_string()),
            StoreError::InvalidCredentials => ApiError::unauthorized(e.to_string()),
            StoreError::AlreadyExists(_) => ApiError::conflict("already_exists", e.to_string()),
            StoreError::OldData => ApiError::conflict("old_data", e.to_string()),
            StoreError::Empty => ApiError::not_found(e.to_string()),
            StoreError::Storage(msg) => {
                error!("storage failure: {msg}");
                ApiError::internal("storage failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            400 => StatusCode::BAD_REQUEST,
            401 => StatusCode::UNAUTHORIZED,
            404 => StatusCode::NOT_FOUND,
            409 => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Result type for JSON handlers.
pub type ApiResult<T> = Result<Json<T>, ApiError>;
