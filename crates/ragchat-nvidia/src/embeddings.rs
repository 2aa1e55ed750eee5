//! NVIDIA AI embeddings client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use ragchat_core::{EmbeddingMode, EmbeddingProvider, Error, Result};

use crate::client::{build_http_client, error_for_status};
use crate::config::NvidiaConfig;

/// Number of texts sent per embeddings request
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeddings client with separate passage and query modes
pub struct NvidiaEmbeddings {
    config: NvidiaConfig,
    client: Client,
    batch_size: usize,
}

#[derive(Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub input: &'a [&'a str],
    pub model: &'a str,
    pub input_type: &'static str,
    pub encoding_format: &'static str,
    pub truncate: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl NvidiaEmbeddings {
    /// Create a new embeddings client from configuration
    pub fn new(config: NvidiaConfig) -> Result<Self> {
        config.validate()?;
        let client = build_http_client(Duration::from_secs(60))?;
        Ok(Self {
            config,
            client,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Create a new embeddings client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = NvidiaConfig::from_env()?;
        Self::new(config)
    }

    /// Set the number of texts sent per request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn embed_batch(&self, inputs: &[&str], mode: EmbeddingMode) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            input: inputs,
            model: &self.config.embedding_model,
            input_type: mode.as_str(),
            encoding_format: "float",
            truncate: "END",
        };

        let response = self
            .client
            .post(self.config.endpoint("embeddings"))
            .bearer_auth(self.config.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for_status(response, "NVIDIA embeddings").await);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        order_embeddings(parsed.data, inputs.len())
    }
}

/// Put response vectors back into request order and check that none are missing
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::Embedding(format!(
            "expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::Embedding(
            "embedding response indices are not contiguous".to_string(),
        ));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for NvidiaEmbeddings {
    async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text], EmbeddingMode::Passage).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("empty embedding response".to_string()))
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text], EmbeddingMode::Query).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("empty embedding response".to_string()))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let inputs: Vec<&str> = batch.iter().map(String::as_str).collect();
            debug!(batch = inputs.len(), "embedding passages");
            vectors.extend(self.embed_batch(&inputs, EmbeddingMode::Passage).await?);
        }
        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        &self.config.embedding_model
    }
}
