//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

/// Sliding-window chunking parameters, measured in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a validated chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters that would make the window stand still
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance the window advances between consecutive chunks
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

/// What to do with an existing snapshot at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Load the snapshot and skip the rebuild when one exists
    ReuseIfPresent,
    /// Always rebuild from the document directory
    AlwaysRebuild,
}

impl ReusePolicy {
    pub fn from_rebuild_flag(rebuild: bool) -> Self {
        if rebuild {
            ReusePolicy::AlwaysRebuild
        } else {
            ReusePolicy::ReuseIfPresent
        }
    }
}

/// Settings for ingestion and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub docs_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub reuse: ReusePolicy,
    /// Descend into subdirectories of `docs_dir`
    pub recursive: bool,
    pub chunking: ChunkingConfig,
    pub top_k: usize,
}

impl RagConfig {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.top_k == 0 {
            return Err(Error::Configuration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./uploaded_docs"),
            snapshot_path: PathBuf::from("./vectorstore.json"),
            reuse: ReusePolicy::ReuseIfPresent,
            recursive: true,
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(
            ChunkingConfig::new(200, 200),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            ChunkingConfig::new(100, 300),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(ChunkingConfig::new(0, 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_step() {
        let config = ChunkingConfig::new(2000, 200).unwrap();
        assert_eq!(config.step(), 1800);
        assert_eq!(ChunkingConfig::new(10, 0).unwrap().step(), 10);
    }

    #[test]
    fn test_reuse_policy_from_flag() {
        assert_eq!(ReusePolicy::from_rebuild_flag(true), ReusePolicy::AlwaysRebuild);
        assert_eq!(ReusePolicy::from_rebuild_flag(false), ReusePolicy::ReuseIfPresent);
    }

    #[test]
    fn test_rag_config_rejects_zero_top_k() {
        let config = RagConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rag_config_snapshot() {
        let config = RagConfig {
            docs_dir: PathBuf::from("docs"),
            snapshot_path: PathBuf::from("index/vectorstore.json"),
            ..Default::default()
        };

        assert_yaml_snapshot!(config, @r###"
        docs_dir: docs
        snapshot_path: index/vectorstore.json
        reuse: reuse_if_present
        recursive: true
        chunking:
          chunk_size: 2000
          chunk_overlap: 200
        top_k: 4
        "###);
    }
}
