use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::pili::HubError;
use crate::storage::StorageError;

/// Every way an API request can fail.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("room service failed: {0}")]
    Upstream(#[from] HubError),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    error: &'a str,
    message: String,
}

impl ApiError {
    /// Stable machine-readable kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Auth(AuthError::MissingCredential) => "missing_credential",
            ApiError::Auth(AuthError::MalformedCredential) => "malformed_credential",
            ApiError::Auth(AuthError::InvalidCredential) => "invalid_credential",
            ApiError::Auth(AuthError::Storage(_)) | ApiError::Storage(_) => "storage",
            ApiError::Validation(_) => "validation",
            ApiError::Conflict(_) => "conflict",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_failure",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Storage(_)) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Auth(_) | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Database details stay in the log.
        let message = match self {
            ApiError::Auth(AuthError::Storage(_)) | ApiError::Storage(_) => {
                tracing::error!(error = %self, "request failed on storage");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(ErrorBody {
            code: status.as_u16(),
            error: self.kind(),
            message,
        })
    }
}
