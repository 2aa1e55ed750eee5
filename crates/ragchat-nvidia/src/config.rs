//! NVIDIA AI endpoints configuration

use ragchat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "mistralai/mixtral-8x7b-instruct-v0.1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nvidia/nv-embedqa-e5-v5";

/// Configuration for the NVIDIA AI endpoints clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NvidiaConfig {
    pub api_key: String,
    pub api_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl NvidiaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("NVIDIA_API_KEY").map_err(|_| {
            Error::Configuration("NVIDIA_API_KEY environment variable not found".to_string())
        })?;

        let api_url = env::var("NVIDIA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let chat_model =
            env::var("NVIDIA_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        let embedding_model = env::var("NVIDIA_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let config = Self {
            api_key,
            api_url,
            chat_model,
            embedding_model,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("NVIDIA API key is empty".to_string()));
        }
        let url = Url::parse(&self.api_url)
            .map_err(|e| Error::Configuration(format!("invalid NVIDIA API URL '{}': {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "NVIDIA API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Join a path onto the API base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
