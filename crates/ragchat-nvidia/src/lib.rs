//! NVIDIA AI endpoints integration for RagChat
//!
//! This crate provides the NVIDIA implementations of the `ChatModelProvider` and
//! `EmbeddingProvider` traits.

mod client;
mod config;
mod embeddings;
mod sse;


pub use client::NvidiaChatClient;
pub use config::{NvidiaConfig, DEFAULT_API_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
pub use embeddings::{NvidiaEmbeddings, DEFAULT_BATCH_SIZE};

// Re-export core types for convenience
pub use ragchat_core::{
    ChatMessage, ChatModelProvider, EmbeddingMode, EmbeddingProvider, Error, GenerationConfig,
    Result,
};
