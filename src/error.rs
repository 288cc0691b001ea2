//! Error types for the gateway
//!
//! Provides the HTTP-facing error type using thiserror. Cache-internal and
//! upstream errors are converted here at the handler boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::intelligence::IntelligenceError;
use crate::models::ErrorResponse;

// == Api Error Enum ==
/// Unified error type for the gateway's HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Path symbol failed validation
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Request body failed to parse or validate
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Webhook signature missing or wrong
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Intelligence service failed and nothing was cached
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] IntelligenceError),

    /// Client exhausted its request window
    #[error("Rate limited for {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl ApiError {
    /// Machine-readable code rendered in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidSymbol(_) => "INVALID_SYMBOL",
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::InvalidSignature(_) => "INVALID_SIGNATURE",
            ApiError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidSymbol(_) | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidPayload(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::InvalidSymbol(msg)
            | ApiError::InvalidPayload(msg)
            | ApiError::InvalidSignature(msg) => msg.clone(),
            ApiError::Upstream(err) => err.to_string(),
            ApiError::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded, retry in {}", retry_phrase(*retry_after_secs))
            }
        };

        let body = Json(ErrorResponse::new(self.code(), message));
        (self.status(), body).into_response()
    }
}

fn retry_phrase(seconds: u64) -> String {
    match seconds {
        60 => "1 minute".to_string(),
        s if s > 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}

// == Internal Errors ==
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected server error. Please retry shortly.";

/// Generic 500 body for failures no handler mapped, such as a panic.
/// Details stay in the logs and the error report.
pub fn internal_error_response() -> Response {
    let body = Json(ErrorResponse::new(INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
