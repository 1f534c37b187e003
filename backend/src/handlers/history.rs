//! HTTP handlers for conversation history

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{ChatTurn, MessageResponse};

use crate::error::{AppError, AppResult};
use crate::services::history::HistoryMap;
use crate::AppState;

/// Get one user's history
/// GET /history/:user_id
pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<ChatTurn>>> {
    state
        .history
        .get(&user_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::HistoryNotFound("No history found for this user.".to_string()))
}

/// Delete one user's history
/// DELETE /history/:user_id
pub async fn delete_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    if !state.history.delete(&user_id).await {
        return Err(AppError::HistoryNotFound(
            "No history found to delete.".to_string(),
        ));
    }

    tracing::info!("Deleted history for user {}", user_id);
    Ok(Json(MessageResponse::new(format!(
        "History for user {} deleted.",
        user_id
    ))))
}

/// Get every user's history
/// GET /history/all_user
pub async fn get_all_history(State(state): State<AppState>) -> AppResult<Json<HistoryMap>> {
    state
        .history
        .get_all()
        .await
        .map(Json)
        .ok_or_else(|| AppError::HistoryNotFound("No chat history found.".to_string()))
}

/// Delete every user's history
/// DELETE /history/all_user
pub async fn delete_all_history(State(state): State<AppState>) -> Json<MessageResponse> {
    state.history.delete_all().await;

    tracing::info!("Deleted all user histories");
    Json(MessageResponse::new("All user histories have been deleted."))
}
