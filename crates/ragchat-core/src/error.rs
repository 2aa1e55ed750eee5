//! Error types for RagChat

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the RagChat pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corrupt snapshot at {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Generation error: {message}")]
    Generation {
        message: String,
        /// Text already streamed to the caller before the failure.
        partial: String,
    },

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Build a `CorruptSnapshot` error for `path`
    pub fn corrupt_snapshot(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Partial answer text carried by a generation failure, if any
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            Error::Generation { partial, .. } if !partial.is_empty() => Some(partial),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
