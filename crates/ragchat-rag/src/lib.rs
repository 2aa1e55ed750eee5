//! Retrieval-augmented answering pipeline for RagChat
//!
//! Documents are read from a directory, split into overlapping windows,
//! embedded and kept in a flat vector index that is snapshotted to disk.
//! A [`Session`] ties ingestion to the question loop and streams answers
//! from the chat model with the retrieved context in the prompt.

pub mod chunker;
pub mod generator;
pub mod hashing;
pub mod index;
pub mod loader;
pub mod session;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use chunker::Chunker;
pub use generator::{augment_question, AnswerGenerator, AnswerStream, DEFAULT_SYSTEM_PROMPT};
pub use hashing::HashingEmbedder;
pub use index::{IndexEntry, VectorIndex};
pub use loader::DocumentLoader;
pub use session::{
    IngestionOutcome, NO_KNOWLEDGE_BASE_NOTICE, Providers, Reply, Session, SessionState,
};
