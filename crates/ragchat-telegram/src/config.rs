//! Telegram Bot API configuration

use ragchat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

impl TelegramConfig {
    /// Read `TELEBOT_API` and `TELEGRAM_CHAT_ID`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot_token = env::var("TELEBOT_API").map_err(|_| {
            Error::Configuration("TELEBOT_API environment variable not found".to_string())
        })?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").map_err(|_| {
            Error::Configuration("TELEGRAM_CHAT_ID environment variable not found".to_string())
        })?;

        let config = Self::new(bot_token, chat_id);
        config.validate()?;
        Ok(config)
    }

    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(Error::Configuration("Telegram bot token is empty".to_string()));
        }
        if self.chat_id.trim().is_empty() {
            return Err(Error::Configuration("Telegram chat id is empty".to_string()));
        }
        Url::parse(&self.api_url).map_err(|e| {
            Error::Configuration(format!("invalid Telegram API URL '{}': {}", self.api_url, e))
        })?;
        Ok(())
    }

    /// `sendMessage` endpoint for this bot
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token.trim()
        )
    }
}
