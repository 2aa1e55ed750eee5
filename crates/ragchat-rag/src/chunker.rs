//! Sliding-window text chunker

use ragchat_core::{Chunk, ChunkingConfig, RawDocument, Result};

/// Splits documents into overlapping windows of characters
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a chunker, rejecting an overlap that is not smaller than the chunk size
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk every document independently, keeping document order
    pub fn split_documents(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|document| self.split_document(document))
            .collect()
    }

    /// Slide a `chunk_size` window over the document, advancing `chunk_size - overlap`
    /// characters each step. The last window may be shorter; windows holding only
    /// whitespace are dropped.
    pub fn split_document(&self, document: &RawDocument) -> Vec<Chunk> {
        let content = document.content.as_str();
        // Byte offset of every character, plus the end of the string.
        let bounds: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < char_count {
            let end = (start + self.config.chunk_size).min(char_count);
            let text = &content[bounds[start]..bounds[end]];
            if !text.trim().is_empty() {
                chunks.push(Chunk::new(text, document.source_path.clone()));
            }
            if end == char_count {
                break;
            }
            start += self.config.step();
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::Error;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingConfig::new(size, overlap).unwrap()).unwrap()
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let doc = RawDocument::new("deadline.txt", "Application deadline is March 1st.");
        let chunks = chunker(2000, 200).split_document(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Application deadline is March 1st.");
        assert_eq!(chunks[0].source_path, doc.source_path);
    }

    #[test]
    fn test_windows_overlap_and_cover_document() {
        let doc = RawDocument::new("abc.txt", "abcdefghij");
        let chunks = chunker(4, 1).split_document(&doc);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_final_chunk_may_be_shorter() {
        let doc = RawDocument::new("abc.txt", "abcdefgh");
        let texts: Vec<_> = chunker(5, 2)
            .split_document(&doc)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["abcde", "defgh"]);

        let doc = RawDocument::new("abc.txt", "abcdefghi");
        let texts: Vec<_> = chunker(5, 2)
            .split_document(&doc)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["abcde", "defgh", "ghi"]);
    }

    #[test]
    fn test_chunk_lengths_are_bounded() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(120);
        let doc = RawDocument::new("fox.txt", text);
        let chunks = chunker(2000, 200).split_document(&doc);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.char_len() <= 2000));
        // The overlap duplicates the tail of the previous chunk.
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(1800).collect();
            assert!(pair[1].text.starts_with(&tail));
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let doc = RawDocument::new("unicode.txt", "ééééé");
        let texts: Vec<_> = chunker(2, 0)
            .split_document(&doc)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_blank_documents_produce_no_chunks() {
        let docs = vec![
            RawDocument::new("empty.txt", ""),
            RawDocument::new("blank.txt", "  \n\n  "),
        ];
        assert!(chunker(10, 2).split_documents(&docs).is_empty());
    }

    #[test]
    fn test_chunking_is_deterministic_and_keeps_attribution() {
        let docs = vec![
            RawDocument::new("a.txt", "alpha beta gamma delta"),
            RawDocument::new("b.txt", "epsilon zeta eta theta"),
        ];
        let chunker = chunker(8, 3);
        let first = chunker.split_documents(&docs);
        let second = chunker.split_documents(&docs);
        assert_eq!(first, second);
        assert!(first.iter().take_while(|c| c.source_path.ends_with("a.txt")).count() > 0);
        assert!(first.last().unwrap().source_path.ends_with("b.txt"));
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_rejected() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(matches!(Chunker::new(config), Err(Error::Configuration(_))));
    }
}
