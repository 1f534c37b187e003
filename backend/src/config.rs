//! Configuration management for Poke LineBot
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. `config.ini` with `[Line]` and `[Gemini]` sections
//! 3. Environment-specific files (config/development.toml, ...)
//! 4. Environment variable overrides with POKEBOT_ prefix

use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Persona handed to Gemini as the system instruction
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "你是一位神奇寶貝中的女性角色「莉莉艾」，個性與回覆內容與該女角一樣，並準確地回答使用者的問題或內容。";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// LINE Messaging API configuration
    #[serde(default, alias = "Line")]
    pub line: LineConfig,

    /// Gemini API configuration
    #[serde(default, alias = "Gemini")]
    pub gemini: GeminiConfig,

    /// Chatbot behaviour
    #[serde(default, alias = "Bot")]
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LineConfig {
    /// LINE Channel Secret, used to verify webhook signatures
    #[serde(default, alias = "CHANNEL_SECRET")]
    pub channel_secret: String,

    /// LINE Messaging API channel access token
    #[serde(default, alias = "CHANNEL_ACCESS_TOKEN")]
    pub channel_access_token: String,

    /// Messaging API base URL
    #[serde(default = "default_line_api_base", alias = "API_BASE")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// Generative Language API key
    #[serde(default, alias = "API_KEY")]
    pub api_key: String,

    /// Generative Language API base URL
    #[serde(default = "default_gemini_api_base", alias = "API_BASE")]
    pub api_base: String,

    /// Model name
    #[serde(default = "default_gemini_model", alias = "MODEL")]
    pub model: String,

    /// Persona prompt sent with every request
    #[serde(default = "default_system_instruction", alias = "SYSTEM_INSTRUCTION")]
    pub system_instruction: String,

    #[serde(default = "default_temperature", alias = "TEMPERATURE")]
    pub temperature: f32,

    #[serde(default = "default_top_p", alias = "TOP_P")]
    pub top_p: f32,

    #[serde(default = "default_top_k", alias = "TOP_K")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens", alias = "MAX_OUTPUT_TOKENS")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Leading character that switches a message into command mode
    #[serde(default = "default_trigger", alias = "TRIGGER")]
    pub trigger: char,
}

fn default_line_api_base() -> String {
    "https://api.line.me".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    64
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_trigger() -> char {
    '~'
}

/// `POKEBOT__SECTION__KEY` overrides
///
/// Values stay strings so digit-only secrets are not reformatted.
fn environment_source() -> Environment {
    Environment::with_prefix("POKEBOT").separator("__")
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("POKEBOT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            // Deployment credentials file
            .add_source(File::new("config.ini", FileFormat::Ini).required(false))
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (POKEBOT_ prefix)
            .add_source(environment_source())
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line.channel_secret.trim().is_empty() {
            return Err(ConfigError::NotFound(
                "line.channel_secret (LINE channel secret)".to_string(),
            ));
        }
        if self.line.channel_access_token.trim().is_empty() {
            return Err(ConfigError::NotFound(
                "line.channel_access_token (LINE channel access token)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            api_base: default_line_api_base(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_gemini_api_base(),
            model: default_gemini_model(),
            system_instruction: default_system_instruction(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        line: LineConfig {
            channel_secret: "test-channel-secret".to_string(),
            channel_access_token: "test-access-token".to_string(),
            ..LineConfig::default()
        },
        gemini: GeminiConfig::default(),
        bot: BotConfig::default(),
    }
}
