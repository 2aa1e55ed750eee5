//! Documents and chunks flowing through ingestion

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file read from the document directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub source_path: PathBuf,
    pub content: String,
}

impl RawDocument {
    pub fn new(source_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            content: content.into(),
        }
    }
}

/// Bounded-size text segment of a document, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_path: PathBuf,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
        }
    }

    /// Length in characters, the unit chunk sizes are measured in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
