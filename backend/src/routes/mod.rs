//! Route definitions for Poke LineBot

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::require_line_signature, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // LINE webhook (signature checked)
        .merge(webhook_routes(state))
        // Conversation history (public)
        .nest("/history", history_routes())
}

/// LINE webhook routes
fn webhook_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/callback", post(handlers::handle_line_webhook))
        .route_layer(middleware::from_fn_with_state(state, require_line_signature))
}

/// History routes; `all_user` takes precedence over the user id parameter
fn history_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/all_user",
            get(handlers::get_all_history).delete(handlers::delete_all_history),
        )
        .route(
            "/:user_id",
            get(handlers::get_history).delete(handlers::delete_history),
        )
}
