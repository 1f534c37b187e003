//! Chatbot commands
//!
//! Text starting with the trigger character (default `~`) is treated as a
//! command instead of being sent to Gemini. Command formats:
//! - `文字`: persona greeting
//! - `貼圖` / `圖片` / `影片` / `位置資訊`: canned sticker, image, video, location
//! - `情緒分析 [sentence]`: sentiment analysis of the sentence via Gemini

use shared::ReplyMessage;

use crate::external::{generate_or_fallback, LanguageModel};

pub const GREETING_REPLY: &str = "我是莉莉艾，請問有什麼問題呢？";
pub const INVALID_COMMAND_REPLY: &str = "無效的指令";

const SENTIMENT_PREFIX: &str = "情緒分析";

const STICKER_PACKAGE_ID: &str = "11537";
const STICKER_ID: &str = "52002734";
const LILLIE_IMAGE_URL: &str =
    "https://truth.bahamut.com.tw/s01/202504/forum/79688/6cf4fbd593fc0a607b7ccf6fe16dfa57.JPG";
const LILLIE_VIDEO_URL: &str =
    "https://kxiangw.github.io/Poke-LineBot/static/%E8%8E%89%E8%8E%89%E8%89%BE.mp4";
const LOCATION_TITLE: &str = "YZU";
const LOCATION_ADDRESS: &str = "320桃園市中壢區遠東路135號";
const LOCATION_LATITUDE: f64 = 24.96861;
const LOCATION_LONGITUDE: f64 = 121.26611;

/// Parsed command from user message
#[derive(Debug, Clone, PartialEq)]
pub enum ChatbotCommand {
    Greeting,
    Sticker,
    Image,
    Video,
    Location,
    /// Sentiment analysis of the trimmed sentence
    Sentiment(String),
    Unknown(String),
}

impl ChatbotCommand {
    /// Parse a command with the trigger character already removed
    pub fn parse(command: &str) -> Self {
        match command {
            "文字" => ChatbotCommand::Greeting,
            "貼圖" => ChatbotCommand::Sticker,
            "圖片" => ChatbotCommand::Image,
            "影片" => ChatbotCommand::Video,
            "位置資訊" => ChatbotCommand::Location,
            _ => match command.strip_prefix(SENTIMENT_PREFIX) {
                Some(sentence) => ChatbotCommand::Sentiment(sentence.trim().to_string()),
                None => ChatbotCommand::Unknown(command.to_string()),
            },
        }
    }

    /// Fixed reply for commands that do not need the model
    pub fn canned_reply(&self) -> Option<ReplyMessage> {
        let message = match self {
            ChatbotCommand::Greeting => ReplyMessage::text(GREETING_REPLY),
            ChatbotCommand::Sticker => ReplyMessage::Sticker {
                package_id: STICKER_PACKAGE_ID.to_string(),
                sticker_id: STICKER_ID.to_string(),
            },
            ChatbotCommand::Image => ReplyMessage::Image {
                original_content_url: LILLIE_IMAGE_URL.to_string(),
                preview_image_url: LILLIE_IMAGE_URL.to_string(),
            },
            ChatbotCommand::Video => ReplyMessage::Video {
                original_content_url: LILLIE_VIDEO_URL.to_string(),
                preview_image_url: LILLIE_IMAGE_URL.to_string(),
            },
            ChatbotCommand::Location => ReplyMessage::Location {
                title: LOCATION_TITLE.to_string(),
                address: LOCATION_ADDRESS.to_string(),
                latitude: LOCATION_LATITUDE,
                longitude: LOCATION_LONGITUDE,
            },
            ChatbotCommand::Unknown(_) => ReplyMessage::text(INVALID_COMMAND_REPLY),
            ChatbotCommand::Sentiment(_) => return None,
        };
        Some(message)
    }
}

/// Wrap a sentence in the sentiment analysis prompt
///
/// The leading newline and indentation are part of the prompt text.
pub fn sentiment_prompt(sentence: &str) -> String {
    format!(
        "
                請分析以下句子的情緒傾向，並以這個格式輸出：
                分析結果：[-正向 / -中性 / -負向]
                理由：[簡單一句話說明情緒判斷的原因]

                句子：
                {}
                ",
        sentence
    )
}

/// Resolve a command into the message to reply with
pub async fn dispatch(command: &str, model: &dyn LanguageModel) -> ReplyMessage {
    let command = ChatbotCommand::parse(command);
    tracing::debug!("Dispatching command: {:?}", command);

    match command {
        ChatbotCommand::Sentiment(sentence) => {
            let analysis = generate_or_fallback(model, &sentiment_prompt(&sentence)).await;
            ReplyMessage::text(analysis)
        }
        other => other
            .canned_reply()
            .unwrap_or_else(|| ReplyMessage::text(INVALID_COMMAND_REPLY)),
    }
}
