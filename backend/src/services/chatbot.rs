//! LINE chatbot service
//!
//! Turns webhook message events into replies:
//! - Text starting with the trigger character runs a command
//! - Any other text is answered by Gemini
//!
//! Every answered message is recorded in the history store before the reply
//! is sent.

use std::sync::Arc;

use serde::Deserialize;
use shared::{ChatTurn, ReplyMessage};

use crate::error::AppResult;
use crate::external::{generate_or_fallback, LanguageModel, ReplySender};
use crate::services::command;
use crate::services::history::HistoryStore;

/// LINE chatbot service
#[derive(Clone)]
pub struct ChatbotService {
    trigger: char,
    model: Arc<dyn LanguageModel>,
    replier: Arc<dyn ReplySender>,
    history: HistoryStore,
}

/// LINE Webhook request body
/// See: https://developers.line.biz/en/reference/messaging-api/#webhook-event-objects
#[derive(Debug, Deserialize)]
pub struct LineWebhookRequest {
    /// User ID of the LINE Official Account that received the webhook event
    #[serde(default)]
    pub destination: String,
    /// Array of webhook event objects
    #[serde(default)]
    pub events: Vec<LineWebhookEvent>,
}

/// LINE Webhook event
/// See: https://developers.line.biz/en/reference/messaging-api/#common-properties
#[derive(Debug, Deserialize)]
pub struct LineWebhookEvent {
    /// Event type
    #[serde(rename = "type")]
    pub event_type: String,
    /// Token for replying to this event (only for events that can be replied to)
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    /// Source of the event
    pub source: Option<LineEventSource>,
    /// Message object (only for message events)
    pub message: Option<LineEventMessage>,
    /// Channel state: "active" or "standby"
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Webhook event ID
    #[serde(rename = "webhookEventId")]
    pub webhook_event_id: Option<String>,
    /// Delivery context for redelivery handling
    #[serde(rename = "deliveryContext")]
    pub delivery_context: Option<DeliveryContext>,
}

fn default_mode() -> String {
    "active".to_string()
}

/// Delivery context for webhook events
#[derive(Debug, Deserialize)]
pub struct DeliveryContext {
    /// Whether this is a redelivered event
    #[serde(rename = "isRedelivery")]
    pub is_redelivery: bool,
}

/// LINE event source
#[derive(Debug, Deserialize)]
pub struct LineEventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// LINE event message
#[derive(Debug, Deserialize)]
pub struct LineEventMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<String>,
}

impl ChatbotService {
    pub fn new(
        trigger: char,
        model: Arc<dyn LanguageModel>,
        replier: Arc<dyn ReplySender>,
        history: HistoryStore,
    ) -> Self {
        Self {
            trigger,
            model,
            replier,
            history,
        }
    }

    /// Process every event of a LINE webhook request
    ///
    /// Stops at the first reply that fails to send.
    pub async fn process_webhook(&self, request: LineWebhookRequest) -> AppResult<()> {
        tracing::debug!(
            "Processing {} webhook event(s) for destination: {}",
            request.events.len(),
            request.destination
        );

        for event in request.events {
            // Skip events in standby mode (for multi-bot scenarios)
            if event.mode == "standby" {
                tracing::debug!("Skipping event in standby mode");
                continue;
            }

            if event.delivery_context.as_ref().is_some_and(|ctx| ctx.is_redelivery) {
                tracing::info!("Processing redelivered event: {:?}", event.webhook_event_id);
            }

            if event.event_type != "message" {
                tracing::debug!("Ignoring {} event", event.event_type);
                continue;
            }

            let text = match &event.message {
                Some(LineEventMessage {
                    message_type,
                    text: Some(text),
                }) if message_type == "text" => text,
                Some(message) => {
                    tracing::debug!("Ignoring {} message", message.message_type);
                    continue;
                }
                None => continue,
            };

            let user_id = event.source.as_ref().and_then(|s| s.user_id.as_deref());
            let (Some(user_id), Some(reply_token)) = (user_id, event.reply_token.as_deref()) else {
                tracing::warn!("Text message without user id or reply token, skipping");
                continue;
            };

            self.handle_text_message(user_id, text, reply_token).await?;
        }
        Ok(())
    }

    /// Answer one text message, record it, and reply
    pub async fn handle_text_message(
        &self,
        user_id: &str,
        text: &str,
        reply_token: &str,
    ) -> AppResult<ReplyMessage> {
        let message = self.build_reply(text).await;

        self.history
            .append(user_id, ChatTurn::new(text, message.history_text()))
            .await;

        self.replier.reply(reply_token, &message).await?;
        Ok(message)
    }

    /// Choose the reply for a text message
    pub async fn build_reply(&self, text: &str) -> ReplyMessage {
        match text.strip_prefix(self.trigger) {
            Some(command) => command::dispatch(command, self.model.as_ref()).await,
            None => ReplyMessage::text(generate_or_fallback(self.model.as_ref(), text).await),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::external::gemini::GatewayError;
    use crate::external::gemini::FALLBACK_REPLY;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prompt with `echo:<prompt>`, or fails when `broken`
    #[derive(Default)]
    pub(crate) struct FakeModel {
        pub broken: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.broken {
                Err(GatewayError::EmptyResponse)
            } else {
                Ok(format!("echo:{}", prompt.trim()))
            }
        }
    }

    /// Collects sent replies, or fails every send when `broken`
    #[derive(Default)]
    pub(crate) struct FakeReplier {
        pub broken: bool,
        pub sent: Mutex<Vec<(String, ReplyMessage)>>,
    }

    #[async_trait]
    impl ReplySender for FakeReplier {
        async fn reply(&self, reply_token: &str, message: &ReplyMessage) -> AppResult<()> {
            if self.broken {
                return Err(AppError::LineApiError("connection refused".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((reply_token.to_string(), message.clone()));
            Ok(())
        }
    }

    fn service(model: Arc<FakeModel>, replier: Arc<FakeReplier>) -> (ChatbotService, HistoryStore) {
        let history = HistoryStore::new();
        (
            ChatbotService::new('~', model, replier, history.clone()),
            history,
        )
    }

    fn webhook(json: &str) -> LineWebhookRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_plain_text_goes_to_model_verbatim() {
        let model = Arc::new(FakeModel::default());
        let replier = Arc::new(FakeReplier::default());
        let (service, history) = service(model.clone(), replier.clone());

        let reply = service.handle_text_message("U1", "皮卡丘是誰？", "token-1").await.unwrap();

        assert_eq!(reply, ReplyMessage::text("echo:皮卡丘是誰？"));
        assert_eq!(*model.prompts.lock().unwrap(), vec!["皮卡丘是誰？".to_string()]);
        assert_eq!(
            *replier.sent.lock().unwrap(),
            vec![("token-1".to_string(), ReplyMessage::text("echo:皮卡丘是誰？"))]
        );
        assert_eq!(
            history.get("U1").await.unwrap(),
            vec![ChatTurn::new("皮卡丘是誰？", "echo:皮卡丘是誰？")]
        );
    }

    #[tokio::test]
    async fn test_greeting_command() {
        let model = Arc::new(FakeModel::default());
        let (service, history) = service(model.clone(), Arc::new(FakeReplier::default()));

        let reply = service.handle_text_message("U1", "~文字", "token").await.unwrap();

        assert_eq!(reply, ReplyMessage::text("我是莉莉艾，請問有什麼問題呢？"));
        assert!(model.prompts.lock().unwrap().is_empty());
        assert_eq!(
            history.get("U1").await.unwrap(),
            vec![ChatTurn::new("~文字", "我是莉莉艾，請問有什麼問題呢？")]
        );
    }

    #[tokio::test]
    async fn test_invalid_command() {
        let (service, _) = service(Arc::new(FakeModel::default()), Arc::new(FakeReplier::default()));

        let reply = service.handle_text_message("U1", "~無此指令", "token").await.unwrap();

        assert_eq!(reply, ReplyMessage::text("無效的指令"));
    }

    #[tokio::test]
    async fn test_non_text_command_records_placeholder() {
        let replier = Arc::new(FakeReplier::default());
        let (service, history) = service(Arc::new(FakeModel::default()), replier.clone());

        let reply = service.handle_text_message("U1", "~貼圖", "token").await.unwrap();

        assert_eq!(reply.kind(), "sticker");
        assert_eq!(replier.sent.lock().unwrap()[0].1, reply);
        assert_eq!(
            history.get("U1").await.unwrap(),
            vec![ChatTurn::new("~貼圖", "[非文字回應]")]
        );
    }

    #[tokio::test]
    async fn test_sentiment_command_uses_template() {
        let model = Arc::new(FakeModel::default());
        let (service, _) = service(model.clone(), Arc::new(FakeReplier::default()));

        let reply = service
            .handle_text_message("U1", "~情緒分析 我好開心", "token")
            .await
            .unwrap();

        let prompt = command::sentiment_prompt("我好開心");
        assert_eq!(*model.prompts.lock().unwrap(), vec![prompt.clone()]);
        assert_eq!(reply, ReplyMessage::text(format!("echo:{}", prompt.trim())));
    }

    #[tokio::test]
    async fn test_model_failure_is_recorded_as_fallback() {
        let model = Arc::new(FakeModel {
            broken: true,
            ..FakeModel::default()
        });
        let replier = Arc::new(FakeReplier::default());
        let (service, history) = service(model, replier.clone());

        let reply = service.handle_text_message("U1", "你好", "token").await.unwrap();

        assert_eq!(reply, ReplyMessage::text(FALLBACK_REPLY));
        assert_eq!(replier.sent.lock().unwrap()[0].1, ReplyMessage::text(FALLBACK_REPLY));
        assert_eq!(
            history.get("U1").await.unwrap(),
            vec![ChatTurn::new("你好", FALLBACK_REPLY)]
        );
    }

    #[tokio::test]
    async fn test_reply_failure_propagates_after_history_append() {
        let replier = Arc::new(FakeReplier {
            broken: true,
            ..FakeReplier::default()
        });
        let (service, history) = service(Arc::new(FakeModel::default()), replier);

        let result = service.handle_text_message("U1", "~文字", "token").await;

        assert!(matches!(result, Err(AppError::LineApiError(_))));
        assert_eq!(history.get("U1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_trigger() {
        let history = HistoryStore::new();
        let service = ChatbotService::new(
            '!',
            Arc::new(FakeModel::default()),
            Arc::new(FakeReplier::default()),
            history,
        );

        assert_eq!(service.build_reply("!文字").await, ReplyMessage::text("我是莉莉艾，請問有什麼問題呢？"));
        assert_eq!(service.build_reply("~文字").await, ReplyMessage::text("echo:~文字"));
    }

    #[tokio::test]
    async fn test_process_webhook_handles_text_events_only() {
        let replier = Arc::new(FakeReplier::default());
        let (service, history) = service(Arc::new(FakeModel::default()), replier.clone());

        let request = webhook(
            r#"{
                "destination": "Ubot",
                "events": [
                    {
                        "type": "message",
                        "replyToken": "token-text",
                        "source": {"type": "user", "userId": "U1"},
                        "message": {"type": "text", "id": "1", "text": "~文字"},
                        "timestamp": 1234567890123,
                        "mode": "active"
                    },
                    {
                        "type": "message",
                        "replyToken": "token-image",
                        "source": {"type": "user", "userId": "U1"},
                        "message": {"type": "image", "id": "2"},
                        "timestamp": 1234567890124
                    },
                    {
                        "type": "follow",
                        "replyToken": "token-follow",
                        "source": {"type": "user", "userId": "U2"},
                        "timestamp": 1234567890125
                    },
                    {
                        "type": "message",
                        "replyToken": "token-standby",
                        "source": {"type": "user", "userId": "U3"},
                        "message": {"type": "text", "id": "3", "text": "hi"},
                        "timestamp": 1234567890126,
                        "mode": "standby"
                    }
                ]
            }"#,
        );

        service.process_webhook(request).await.unwrap();

        let sent = replier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "token-text");
        assert_eq!(history.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_process_webhook_skips_events_without_user() {
        let replier = Arc::new(FakeReplier::default());
        let (service, history) = service(Arc::new(FakeModel::default()), replier.clone());

        let request = webhook(
            r#"{
                "destination": "Ubot",
                "events": [
                    {
                        "type": "message",
                        "replyToken": "token",
                        "source": {"type": "group", "groupId": "G1"},
                        "message": {"type": "text", "id": "1", "text": "hello"},
                        "timestamp": 1234567890123
                    }
                ]
            }"#,
        );

        service.process_webhook(request).await.unwrap();

        assert!(replier.sent.lock().unwrap().is_empty());
        assert!(history.get_all().await.is_none());
    }

    #[test]
    fn test_webhook_request_deserialization() {
        let request = webhook(
            r#"{
                "destination": "U1234567890abcdef",
                "events": [
                    {
                        "type": "message",
                        "replyToken": "reply-token-123",
                        "source": {"type": "user", "userId": "U9876543210fedcba"},
                        "message": {"type": "text", "id": "msg-123", "text": "~文字", "quoteToken": "q"},
                        "timestamp": 1234567890123,
                        "mode": "active",
                        "webhookEventId": "event-id-789",
                        "deliveryContext": {"isRedelivery": true}
                    }
                ]
            }"#,
        );

        assert_eq!(request.destination, "U1234567890abcdef");
        let event = &request.events[0];
        assert_eq!(event.reply_token.as_deref(), Some("reply-token-123"));
        assert_eq!(event.webhook_event_id.as_deref(), Some("event-id-789"));
        assert!(event.delivery_context.as_ref().unwrap().is_redelivery);

        let source = event.source.as_ref().unwrap();
        assert_eq!(source.source_type, "user");
        assert_eq!(source.user_id.as_deref(), Some("U9876543210fedcba"));

        let message = event.message.as_ref().unwrap();
        assert_eq!(message.message_type, "text");
        assert_eq!(message.text.as_deref(), Some("~文字"));
    }

    #[test]
    fn test_webhook_verification_request_has_no_events() {
        let request = webhook(r#"{"destination": "U1234567890abcdef", "events": []}"#);

        assert!(request.events.is_empty());
    }
}
