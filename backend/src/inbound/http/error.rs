//! HTTP error payloads and mapping from domain errors.
//!
//! Keep the domain free of transport concerns by translating
//! [`DomainError`] into Actix responses here. Internal errors are logged
//! with context and surfaced to the client as an opaque 500.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{DomainError, ErrorCode};

/// Standard error envelope returned by HTTP adapters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "Something went wrong")]
    message: String,
}

impl ApiError {
    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    fn to_status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self {
            code: value.code(),
            message: value.message().to_owned(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.to_status_code()
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code, ErrorCode::InternalError) {
            error!(detail = %self.message, "internal error surfaced to client");
            let redacted = Self {
                code: ErrorCode::InternalError,
                message: "Internal server error".to_owned(),
            };
            return HttpResponse::build(self.status_code()).json(redacted);
        }
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Convenience alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;
