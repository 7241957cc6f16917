//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// A contiguous, bounded segment of corpus text used as the unit of retrieval.
///
/// Chunks are created once during ingestion, owned by the [`VectorIndex`]
/// they were built into, and immutable for its lifetime.
///
/// [`VectorIndex`]: crate::index::VectorIndex
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier unique within the corpus, assigned sequentially at build.
    pub id: usize,
    /// Text content of the chunk.
    pub text: String,
    /// Char offset of this text within the concatenated corpus.
    pub source_offset: usize,
}

/// Chunker output before the index assigns ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Text content of the segment.
    pub text: String,
    /// Char offset of this text within the input it was split from.
    pub source_offset: usize,
}

impl Segment {
    /// Creates a segment.
    #[must_use]
    pub fn new(text: impl Into<String>, source_offset: usize) -> Self {
        Self {
            text: text.into(),
            source_offset,
        }
    }
}

/// A `(Chunk, Embedding)` pair stored in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk.
    pub chunk: Chunk,
    /// The embedding vector, 1:1 with the chunk.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// One retrieved chunk with its similarity score.
///
/// Retrieval results are ordered by strictly non-increasing score, ties
/// broken by ascending chunk id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Cosine similarity score (1.0 = identical direction).
    pub score: f32,
}
