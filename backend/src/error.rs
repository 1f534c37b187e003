//! Error handling for Poke LineBot
//!
//! Provides consistent JSON error responses for the webhook and history API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::MessageResponse;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Webhook errors
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Bad request: {0}")]
    BadRequest(String),

    // History lookups
    #[error("History not found: {0}")]
    HistoryNotFound(String),

    // External service errors
    #[error("LINE API error: {0}")]
    LineApiError(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            // History misses are an expected outcome, not a failure
            AppError::HistoryNotFound(message) => {
                tracing::debug!("History lookup miss: {}", message);
                return (
                    StatusCode::NOT_FOUND,
                    Json(MessageResponse::new(message.clone())),
                )
                    .into_response();
            }
            AppError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_SIGNATURE".to_string(),
                    message: "Invalid signature".to_string(),
                },
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "BAD_REQUEST".to_string(),
                    message: msg.clone(),
                },
            ),
            AppError::LineApiError(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "LINE_API_ERROR".to_string(),
                    message: format!("LINE API error: {}", msg),
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
