//! Poke LineBot - Backend Server
//!
//! A LINE chatbot that answers as Lillie through Gemini, replies to a few
//! canned commands, and keeps per-user conversation history in memory.

use axum::{routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

use external::{GeminiClient, LineMessagingClient};
use services::{ChatbotService, HistoryStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub history: HistoryStore,
    pub chatbot: ChatbotService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poke_linebot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    tracing::info!("Starting Poke LineBot Server");
    tracing::info!("Environment: {}", config.environment);

    if config.gemini.api_key.trim().is_empty() {
        tracing::warn!("Gemini API key is not set; every model reply will use the fallback text");
    }

    // Create application state
    let history = HistoryStore::new();
    let chatbot = ChatbotService::new(
        config.bot.trigger,
        Arc::new(GeminiClient::new(config.gemini.clone())),
        Arc::new(LineMessagingClient::new(&config.line)),
        history.clone(),
    );
    let state = AppState {
        config: Arc::new(config.clone()),
        history,
        chatbot,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .merge(routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Poke LineBot API v0.1"
}
