//! Embedding provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Which side of retrieval a text is embedded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Corpus text stored in the index
    Passage,
    /// User question used to search the index
    Query,
}

impl EmbeddingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingMode::Passage => "passage",
            EmbeddingMode::Query => "query",
        }
    }
}

/// Trait for embedding models
///
/// Document-mode and query-mode vectors must be comparable under the index metric,
/// and repeated calls on the same text should return the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a chunk of corpus text
    async fn embed_document(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a user question
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many chunks, preserving order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_document(text).await?);
        }
        Ok(vectors)
    }

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
