//! Retrieval results handed from the index to the answer generator

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Chunk;

/// A chunk returned by a nearest-neighbour query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Distance to the query under the index metric (smaller is closer)
    pub distance: f32,
}

/// Chunks ranked by ascending distance, built per question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievedContext {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self { chunks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk texts in rank order
    fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.chunk.text.as_str())
    }

    /// Concatenate chunk texts in rank order, each followed by a blank line
    pub fn joined(&self) -> String {
        let mut context = String::new();
        for text in self.texts() {
            context.push_str(text);
            context.push_str("\n\n");
        }
        context
    }

    /// Distinct source files in rank order
    pub fn sources(&self) -> Vec<&Path> {
        let mut sources: Vec<&Path> = Vec::new();
        for retrieved in &self.chunks {
            let path = retrieved.chunk.source_path.as_path();
            if !sources.contains(&path) {
                sources.push(path);
            }
        }
        sources
    }
}
