//! Embedding collaborator interface.

use core::future::Future;

/// Converts text to fixed-length vector representations.
///
/// The pipeline treats the embedding model as an opaque collaborator: one
/// call per chunk during ingestion, one call per question at retrieval time.
///
/// # Implementation requirements
///
/// - [`embed`](EmbeddingModel::embed) must return vectors whose length
///   equals [`dim`](EmbeddingModel::dim); the index rejects anything else.
/// - Embedding must be deterministic in dimensionality for the lifetime of
///   the instance.
pub trait EmbeddingModel: Send + Sync {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Converts text to an embedding vector of length [`Self::dim`].
    fn embed(&self, text: &str) -> impl Future<Output = anyhow::Result<Vec<f32>>> + Send;
}
