//! Common error types for the image gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
///
/// Every layer returns one of these; the kind is kept intact for logging and
/// tests and only flattened into a `{"detail": ...}` body at the HTTP boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid image quality: {0}")]
    InvalidTier(String),

    #[error("Invalid model type: {0}")]
    InvalidModelFamily(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("X-Token header invalid")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    GenerationFailure(String),

    #[error("Generation queue is full")]
    QueueFull,

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl AppError {
    /// Shorthand for a configuration error built from a message
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(config::ConfigError::Message(message.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidTier(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidModelFamily(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::GenerationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::GenerationFailure(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::GenerationFailure(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
