#![forbid(unsafe_code)]

//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use linkpad_transfer::InflateError;

/// Failure of an API request, rendered as `{ "error", "message" }`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing, oversized, or undecodable token. 400.
    InvalidRequest(String),
    /// Well-formed token whose payload would not inflate. 500.
    DecompressionFailed(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DecompressionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::DecompressionFailed(_) => "decompression_failed",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest(message) | Self::DecompressionFailed(message) => message,
        }
    }
}

impl From<InflateError> for ApiError {
    fn from(err: InflateError) -> Self {
        match err {
            InflateError::InvalidToken(_) => Self::InvalidRequest(err.to_string()),
            InflateError::DecompressionFailed(_) => Self::DecompressionFailed(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), message = self.message(), "request failed");
        } else {
            tracing::debug!(kind = self.kind(), message = self.message(), "request rejected");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
