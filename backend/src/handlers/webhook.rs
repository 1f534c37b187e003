//! HTTP handler for the LINE webhook

use axum::{body::Bytes, extract::State};

use crate::error::{AppError, AppResult};
use crate::services::chatbot::LineWebhookRequest;
use crate::AppState;

/// Handle LINE webhook events
/// POST /callback
///
/// The signature has already been checked by `require_line_signature`.
pub async fn handle_line_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<&'static str> {
    tracing::info!("Request body: {}", String::from_utf8_lossy(&body));

    let request: LineWebhookRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse LINE webhook: {}", e);
        AppError::BadRequest(format!("Invalid request body: {}", e))
    })?;

    state.chatbot.process_webhook(request).await?;

    Ok("OK")
}
