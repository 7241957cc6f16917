//! Build-once vector index with parallel cosine scoring.

use std::cmp::Reverse;
use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use tracing::debug;

use crate::embedding::EmbeddingModel;
use crate::error::{ChatError, Result};
use crate::types::{Chunk, IndexEntry, Segment, SearchResult};

/// Default number of embedding calls in flight during a build.
pub const DEFAULT_EMBED_CONCURRENCY: usize = 8;

/// Immutable vector index over a chunked corpus.
///
/// Built once per corpus via [`VectorIndex::build`]; after that it is
/// read-only and safe to share (`Arc`) across concurrent sessions without
/// locking. Scoring is an exact parallel scan over cosine similarity, which
/// comfortably covers corpora up to hundreds of thousands of chunks.
///
/// Result ordering is deterministic: descending similarity, ties broken by
/// ascending chunk id.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embeds every segment and builds a fully populated index.
    ///
    /// Embedding runs with bounded concurrency
    /// ([`DEFAULT_EMBED_CONCURRENCY`] calls in flight); results are joined
    /// before the index is returned, so a partially built index is never
    /// observable. Ids are assigned sequentially from zero in segment order.
    ///
    /// # Errors
    /// [`ChatError::EmptyCorpus`] if `segments` is empty,
    /// [`ChatError::Embedding`] if the embedder fails, and
    /// [`ChatError::DimensionMismatch`] if any returned vector disagrees
    /// with the embedder's declared dimension.
    pub async fn build<M: EmbeddingModel>(segments: Vec<Segment>, embedder: &M) -> Result<Self> {
        Self::build_with_concurrency(segments, embedder, DEFAULT_EMBED_CONCURRENCY).await
    }

    /// Like [`VectorIndex::build`] with an explicit concurrency width.
    ///
    /// # Errors
    /// See [`VectorIndex::build`].
    pub async fn build_with_concurrency<M: EmbeddingModel>(
        segments: Vec<Segment>,
        embedder: &M,
        concurrency: usize,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(ChatError::EmptyCorpus);
        }
        let dimension = embedder.dim();

        // `buffered` keeps at most `concurrency` embed calls in flight and
        // yields results in segment order, so ids line up with input order.
        let embeddings: Vec<Vec<f32>> =
            stream::iter(segments.iter().map(|segment| embedder.embed(&segment.text)))
                .buffered(concurrency.max(1))
                .try_collect()
                .await
                .map_err(ChatError::Embedding)?;

        let mut entries = Vec::with_capacity(segments.len());
        for (id, (segment, embedding)) in segments.into_iter().zip(embeddings).enumerate() {
            if embedding.len() != dimension {
                return Err(ChatError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            let chunk = Chunk {
                id,
                text: segment.text,
                source_offset: segment.source_offset,
            };
            entries.push(IndexEntry::new(chunk, embedding));
        }

        debug!(chunks = entries.len(), dimension, "vector index built");
        Ok(Self { dimension, entries })
    }

    /// Builds an index from precomputed entries.
    ///
    /// # Errors
    /// [`ChatError::EmptyCorpus`] on empty input,
    /// [`ChatError::DimensionMismatch`] if entry dimensions disagree, and
    /// [`ChatError::Configuration`] on duplicate chunk ids.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Err(ChatError::EmptyCorpus);
        };
        let dimension = first.embedding.len();
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.embedding.len() != dimension {
                return Err(ChatError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.embedding.len(),
                });
            }
            if !seen.insert(entry.chunk.id) {
                return Err(ChatError::Configuration(format!(
                    "duplicate chunk id {}",
                    entry.chunk.id
                )));
            }
        }
        Ok(Self { dimension, entries })
    }

    /// Returns the `k` entries most similar to `query` by cosine similarity.
    ///
    /// `k` is clamped to the index size; `k = 0` yields an empty result.
    /// Ordering is strictly non-increasing score, ties by ascending id.
    ///
    /// # Errors
    /// [`ChatError::EmptyIndex`] if the index holds zero entries and
    /// [`ChatError::DimensionMismatch`] if the query has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Err(ChatError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(ChatError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .par_iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, query),
            })
            .collect();

        scored.sort_unstable_by_key(|result| (Reverse(OrderedFloat(result.score)), result.chunk.id));
        scored.truncate(k.min(scored.len()));
        Ok(scored)
    }

    /// Embedding dimension this index was built with.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
