//! Core traits and types for RagChat
//!
//! This crate defines the capability-facing interfaces of the retrieval-augmented
//! chat pipeline: embedding models, streaming chat models and the notification
//! side-channel, together with the shared data model and error taxonomy.

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod notifier;
pub mod rag;

pub use config::{ChunkingConfig, RagConfig, ReusePolicy, DEFAULT_TOP_K};
pub use document::{Chunk, RawDocument};
pub use embedding::{EmbeddingMode, EmbeddingProvider};
pub use error::{Error, Result};
pub use llm::{
    ChatMessage, ChatModelProvider, ConversationMessage, GenerationConfig, Role, TokenStream,
};
pub use notifier::{NoopNotifier, Notifier};
pub use rag::{RetrievedChunk, RetrievedContext};
