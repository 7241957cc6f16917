//! Query-time retrieval: embed once, search top-k.

use tracing::debug;

use crate::embedding::EmbeddingModel;
use crate::error::{ChatError, Result};
use crate::index::VectorIndex;
use crate::types::SearchResult;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Wraps the index with a query-time embedding step and a top-k policy.
///
/// Stateless and side-effect-free beyond the single embedding call per
/// question, so one retriever may serve any number of sessions.
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    top_k: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl Retriever {
    /// Creates a retriever returning at most `top_k` chunks per question.
    #[must_use]
    pub const fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Number of chunks retrieved per question.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embeds `question` once and returns the best matching chunks.
    ///
    /// # Errors
    /// [`ChatError::Embedding`] if the embedder fails, plus any
    /// [`VectorIndex::search`] error.
    pub async fn retrieve<M: EmbeddingModel>(
        &self,
        question: &str,
        embedder: &M,
        index: &VectorIndex,
    ) -> Result<Vec<SearchResult>> {
        let query = embedder
            .embed(question)
            .await
            .map_err(ChatError::Embedding)?;
        let hits = index.search(&query, self.top_k)?;
        debug!(hits = hits.len(), top_k = self.top_k, "retrieved context");
        Ok(hits)
    }
}
