//! Reply message payloads
//!
//! Mirrors the LINE Messaging API message objects the bot is able to send.
//! See: https://developers.line.biz/en/reference/messaging-api/#message-objects

use serde::{Deserialize, Serialize};

/// Text recorded in history for replies that carry no text
pub const NON_TEXT_HISTORY_PLACEHOLDER: &str = "[非文字回應]";

/// A single reply message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplyMessage {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        original_content_url: String,
        preview_image_url: String,
    },
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
}

impl ReplyMessage {
    /// Build a text reply
    pub fn text(text: impl Into<String>) -> Self {
        ReplyMessage::Text { text: text.into() }
    }

    /// LINE message type name
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyMessage::Text { .. } => "text",
            ReplyMessage::Sticker { .. } => "sticker",
            ReplyMessage::Image { .. } => "image",
            ReplyMessage::Video { .. } => "video",
            ReplyMessage::Location { .. } => "location",
        }
    }

    /// Text stored as the bot side of a chat turn
    pub fn history_text(&self) -> &str {
        match self {
            ReplyMessage::Text { text } => text,
            _ => NON_TEXT_HISTORY_PLACEHOLDER,
        }
    }
}
