//! LINE Messaging API client
//!
//! Sends reply messages using the single-use reply token from a webhook event.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::ReplyMessage;

use crate::config::LineConfig;
use crate::error::{AppError, AppResult};

/// Anything able to answer a webhook event
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply(&self, reply_token: &str, message: &ReplyMessage) -> AppResult<()>;
}

/// LINE Messaging API client
#[derive(Clone)]
pub struct LineMessagingClient {
    channel_access_token: String,
    api_base: String,
    http_client: Client,
}

/// LINE reply message request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LineReplyRequest<'a> {
    reply_token: &'a str,
    messages: [&'a ReplyMessage; 1],
}

/// LINE API error body
#[derive(Debug, Deserialize)]
struct LineApiResponse {
    #[serde(default)]
    message: Option<String>,
}

impl LineMessagingClient {
    /// Create a new LINE messaging client
    pub fn new(config: &LineConfig) -> Self {
        Self {
            channel_access_token: config.channel_access_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl ReplySender for LineMessagingClient {
    async fn reply(&self, reply_token: &str, message: &ReplyMessage) -> AppResult<()> {
        let request = LineReplyRequest {
            reply_token,
            messages: [message],
        };

        let response = self
            .http_client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.channel_access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::LineApiError(format!("LINE reply error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error: LineApiResponse = response
                .json()
                .await
                .unwrap_or(LineApiResponse { message: None });
            return Err(AppError::LineApiError(format!(
                "LINE reply failed: {} {}",
                status,
                error.message.unwrap_or_else(|| "Unknown error".to_string())
            )));
        }

        tracing::debug!("LINE {} reply sent", message.kind());
        Ok(())
    }
}
