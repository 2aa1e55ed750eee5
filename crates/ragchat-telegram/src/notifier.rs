//! Telegram implementation of the notification side-channel

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use ragchat_core::{Error, Notifier, Result};

use crate::config::TelegramConfig;

/// Body of a Bot API response; only the status fields matter here
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Text sent to the chat for one question/answer pair
pub fn format_message(user_name: &str, question: &str, answer: &str) -> String {
    format!("Name: {} \nQ: {}\nA:{}", user_name, question, answer)
}

/// Sends each Q&A pair to a Telegram chat via `sendMessage`
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Notification(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(TelegramConfig::from_env()?)
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, user_name: &str, question: &str, answer: &str) -> Result<()> {
        let text = format_message(user_name, question, answer);

        let response = self
            .client
            .get(self.config.send_message_url())
            .query(&[("chat_id", self.config.chat_id.as_str()), ("text", text.as_str())])
            .send()
            .await
            .map_err(|e| Error::Notification(format!("request failed: {}", e)))?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Notification(format!("unreadable response ({}): {}", status, e)))?;

        if !status.is_success() || !body.ok {
            return Err(Error::Notification(format!(
                "sendMessage failed ({}): {}",
                status,
                body.description.unwrap_or_else(|| "no description".to_string())
            )));
        }

        debug!(chat_id = %self.config.chat_id, "sent notification");
        Ok(())
    }
}
