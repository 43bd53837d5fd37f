//! Custom error types for the API service

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::RepositoryError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::upload::UploadError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown user or image
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uploaded file over the size ceiling
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Uploaded file is not an image
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Repository error, whatever the backing store
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidFileType { .. } => ApiError::UnsupportedMediaType(err.to_string()),
            UploadError::FileTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            UploadError::TooManyFiles(_) | UploadError::NoFiles => {
                ApiError::BadRequest(err.to_string())
            }
            UploadError::UserNotFound => ApiError::NotFound(err.to_string()),
            UploadError::Repository(e) => ApiError::Repository(e),
            UploadError::Storage(e) => {
                error!("Blob storage failure: {:#}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                ApiError::UnsupportedMediaType(rejection.body_text())
            }
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Repository(e) => {
                error!("Repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_errors_map_to_client_errors() {
        let cases = [
            (
                UploadError::InvalidFileType { name: "a.txt".to_string() },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                UploadError::FileTooLarge { name: "a.png".to_string(), size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (UploadError::NoFiles, StatusCode::BAD_REQUEST),
            (UploadError::TooManyFiles(10), StatusCode::BAD_REQUEST),
            (UploadError::UserNotFound, StatusCode::NOT_FOUND),
            (
                UploadError::Storage(anyhow::anyhow!("bucket unreachable")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_conflict_is_a_server_error() {
        let err = ApiError::from(RepositoryError::Conflict("duplicate email".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
