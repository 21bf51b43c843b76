/**
 * API Errors
 * Every handler failure becomes one of these and is rendered as a fixed JSON body
 */
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("user already exists")]
    DuplicateUser,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The request body could not be read as the expected JSON.
    #[error("rejected request body: {message}")]
    Rejected { status: StatusCode, message: String },

    /// The detail is logged, never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Body for failures that only carry a message
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Body for registration failures
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUser => ApiError::DuplicateUser,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateUser => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::DuplicateUser => (
                status,
                Json(FailureResponse {
                    success: false,
                    message: "User already exists".to_string(),
                }),
            )
                .into_response(),
            ApiError::InvalidCredentials => (
                status,
                Json(ErrorResponse {
                    message: "Invalid email or password".to_string(),
                }),
            )
                .into_response(),
            ApiError::NotFound(label) => (
                status,
                Json(ErrorResponse {
                    message: format!("{} not found", label),
                }),
            )
                .into_response(),
            ApiError::Unauthorized(reason) => (
                status,
                Json(ErrorResponse {
                    message: reason.to_string(),
                }),
            )
                .into_response(),
            ApiError::Rejected { message, .. } => {
                tracing::debug!(status = %status, error = %message, "request body rejected");
                (status, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    status,
                    Json(ErrorResponse {
                        message: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
