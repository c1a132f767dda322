//! API error types

use axum::{
    extract::rejection::BytesRejection,
    extract::multipart::MultipartError,
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    PayloadTooLargeError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::PayloadTooLargeError => write!(f, "payload_too_large_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Error body: `{"detail": "...", "type": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, detail: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                detail: detail.into(),
                error_type,
            },
        }
    }

    /// Bad request error
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, detail)
    }

    /// Not found error
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, detail)
    }

    /// Request body over the configured limit
    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorType::PayloadTooLargeError,
            detail,
        )
    }

    /// Internal server error
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, detail)
    }

    /// Keep the status chosen by axum for a body/multipart rejection
    fn from_rejection(status: StatusCode, detail: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::payload_too_large(detail)
        } else if status.is_client_error() {
            Self::bad_request(detail)
        } else {
            Self::internal(detail)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.response.detail, "Request failed");
        }
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::InvalidInput { message } => Self::bad_request(message),
            DomainError::Decode { message } => {
                Self::bad_request(format!("Uploaded file is not a valid image: {}", message))
            }
            DomainError::UnsupportedCrop { .. } => Self::not_found(err.to_string()),
            DomainError::ModelLoad { .. }
            | DomainError::Inference { .. }
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::from_rejection(
            err.status(),
            format!("Failed to read multipart field: {}", err.body_text()),
        )
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::from_rejection(
            rejection.status(),
            format!("Failed to read request body: {}", rejection.body_text()),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.error_type, self.response.detail)
    }
}

impl std::error::Error for ApiError {}
