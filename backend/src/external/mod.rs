//! External API integrations

pub mod gemini;
pub mod line;

pub use gemini::{generate_or_fallback, GeminiClient, LanguageModel};
pub use line::{LineMessagingClient, ReplySender};
