//! NVIDIA AI chat completions client

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use ragchat_core::{
    ChatMessage, ChatModelProvider, Error, GenerationConfig, Result, TokenStream,
};

use crate::config::NvidiaConfig;
use crate::sse::token_stream;

/// Streaming chat client for the OpenAI-compatible NVIDIA endpoints
pub struct NvidiaChatClient {
    config: NvidiaConfig,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_tokens: u32,
    pub stream: bool,
}

impl NvidiaChatClient {
    /// Create a new chat client from configuration
    pub fn new(config: NvidiaConfig) -> Result<Self> {
        config.validate()?;
        let generation = GenerationConfig {
            model_id: config.chat_model.clone(),
            ..Default::default()
        };
        let client = build_http_client(generation.timeout)?;

        Ok(Self {
            config,
            generation,
            client,
        })
    }

    /// Create a new chat client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = NvidiaConfig::from_env()?;
        Self::new(config)
    }

    /// Override sampling parameters and timeout
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Result<Self> {
        self.client = build_http_client(generation.timeout)?;
        self.generation = generation;
        Ok(self)
    }

    pub(crate) fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.generation.model_id,
            messages,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            max_tokens: self.generation.max_tokens,
            stream: true,
        }
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

/// Map a non-success response onto the error taxonomy
pub(crate) async fn error_for_status(response: Response, what: &str) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
            "{} rejected credentials ({}): {}",
            what, status, body
        )),
        _ => Error::Network(format!("{} failed with status {}: {}", what, status, body)),
    }
}

#[async_trait]
impl ChatModelProvider for NvidiaChatClient {
    async fn stream_complete(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let url = self.config.endpoint("chat/completions");
        debug!(model = %self.generation.model_id, messages = messages.len(), "starting chat stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.trim())
            .header("Accept", "text/event-stream")
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for_status(response, "NVIDIA chat completion").await);
        }

        Ok(token_stream(response.bytes_stream()))
    }

    fn model_id(&self) -> &str {
        &self.generation.model_id
    }
}
