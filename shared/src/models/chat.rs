//! Conversation history models

use serde::{Deserialize, Serialize};

/// One exchange between a user and the bot
///
/// Serialized as `{"user": ..., "bot": ...}`, the shape the history API
/// has always returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    #[serde(rename = "user")]
    pub user_input: String,
    #[serde(rename = "bot")]
    pub bot_reply: String,
}

impl ChatTurn {
    pub fn new(user_input: impl Into<String>, bot_reply: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            bot_reply: bot_reply.into(),
        }
    }
}
