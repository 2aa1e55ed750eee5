//! Flat vector index with versioned JSON snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use ragchat_core::{
    Chunk, EmbeddingProvider, Error, Result, RetrievedChunk, RetrievedContext,
};

const SNAPSHOT_FORMAT: &str = "ragchat-index";
const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_METRIC: &str = "l2";

/// A chunk together with its document-mode embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Exact nearest-neighbour index under squared Euclidean distance
///
/// Entries keep insertion order, which is also the tie-break order for equal
/// distances. An index with no entries is the "empty index" sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    /// Embedding model the vectors came from
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: &'static str,
    version: u32,
    metric: &'static str,
    model: &'a str,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct SnapshotHeader {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
struct Snapshot {
    metric: String,
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// The index returned when there is nothing to index
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from pre-computed entries, checking that all vectors agree in dimension
    pub fn from_entries(model: impl Into<String>, entries: Vec<IndexEntry>) -> Result<Self> {
        let dimension = entries.first().map_or(0, |e| e.embedding.len());
        for (i, entry) in entries.iter().enumerate() {
            check_vector(&entry.embedding, dimension)
                .map_err(|reason| Error::VectorIndex(format!("entry {}: {}", i, reason)))?;
        }
        Ok(Self {
            model: model.into(),
            dimension,
            entries,
        })
    }

    /// Embed every chunk in document mode and index it
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self::empty());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedded {} of {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        let index = Self::from_entries(embedder.model_id(), entries)?;
        info!(
            chunks = index.len(),
            dimension = index.dimension,
            model = embedder.model_id(),
            "built vector index"
        );
        Ok(index)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Write the whole index to `path`, atomically replacing any existing snapshot
    ///
    /// Returns the number of bytes written.
    pub fn persist(&self, path: &Path) -> Result<u64> {
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let snapshot = SnapshotRef {
            format: SNAPSHOT_FORMAT,
            version: SNAPSHOT_VERSION,
            metric: SNAPSHOT_METRIC,
            model: &self.model,
            dimension: self.dimension,
            created_at: Utc::now(),
            entries: &self.entries,
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        let bytes = tmp.as_file().metadata()?.len();
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        info!(path = %path.display(), bytes, chunks = self.len(), "saved vector index snapshot");
        Ok(bytes)
    }

    /// Read a snapshot written by [`VectorIndex::persist`]
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;

        let header: SnapshotHeader = serde_json::from_slice(&bytes)
            .map_err(|e| Error::corrupt_snapshot(path, format!("unreadable header: {}", e)))?;
        if header.format != SNAPSHOT_FORMAT {
            return Err(Error::corrupt_snapshot(
                path,
                format!("unknown format '{}'", header.format),
            ));
        }
        if header.version != SNAPSHOT_VERSION {
            return Err(Error::corrupt_snapshot(
                path,
                format!("unsupported version {}", header.version),
            ));
        }

        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| Error::corrupt_snapshot(path, e.to_string()))?;
        if snapshot.metric != SNAPSHOT_METRIC {
            return Err(Error::corrupt_snapshot(
                path,
                format!("unsupported metric '{}'", snapshot.metric),
            ));
        }
        if snapshot.entries.is_empty() {
            return Ok(Self::empty());
        }
        for (i, entry) in snapshot.entries.iter().enumerate() {
            check_vector(&entry.embedding, snapshot.dimension)
                .map_err(|reason| Error::corrupt_snapshot(path, format!("entry {}: {}", i, reason)))?;
        }

        debug!(
            path = %path.display(),
            chunks = snapshot.entries.len(),
            model = %snapshot.model,
            "loaded vector index snapshot"
        );
        Ok(Self {
            model: snapshot.model,
            dimension: snapshot.dimension,
            entries: snapshot.entries,
        })
    }

    /// Embed `query_text` in query mode and return the `k` closest chunks
    pub async fn query(
        &self,
        query_text: &str,
        embedder: &dyn EmbeddingProvider,
        k: usize,
    ) -> Result<RetrievedContext> {
        if self.is_empty() || k == 0 {
            return Ok(RetrievedContext::empty());
        }
        let query = embedder.embed_query(query_text).await?;
        Ok(RetrievedContext::new(self.nearest(&query, k)?))
    }

    /// Rank entries by ascending distance to `query`; equal distances keep insertion order
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        check_vector(query, self.dimension)
            .map_err(|reason| Error::Embedding(format!("query vector {}", reason)))?;

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (squared_l2(query, &entry.embedding), entry))
            .collect();
        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| RetrievedChunk {
                chunk: entry.chunk.clone(),
                distance,
            })
            .collect())
    }
}

fn check_vector(vector: &[f32], dimension: usize) -> std::result::Result<(), String> {
    if dimension == 0 {
        return Err("has zero dimension".to_string());
    }
    if vector.len() != dimension {
        return Err(format!(
            "has dimension {}, expected {}",
            vector.len(),
            dimension
        ));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err("contains a non-finite component".to_string());
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
