//! Error types for the conversation pipeline.

use thiserror::Error;

/// Errors surfaced at the library boundary.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid chunking or session parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Text extraction failed for one document.
    ///
    /// Recoverable: ingestion records the failure per document and continues
    /// with the rest of the corpus.
    #[error("extraction failed for document `{document}`: {source}")]
    Extraction {
        /// Name of the document that could not be extracted.
        document: String,
        /// Underlying extractor error.
        #[source]
        source: anyhow::Error,
    },

    /// The embedding collaborator failed.
    ///
    /// Fatal to the ingestion or retrieval call that triggered it.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// The generation collaborator failed.
    ///
    /// Recoverable: session state and memory are unchanged, the caller may
    /// retry the same question.
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    /// An embedding's length disagrees with the embedder's declared dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual vector length observed.
        actual: usize,
    },

    /// Ingestion produced no text to index.
    #[error("empty corpus: no document yielded indexable text")]
    EmptyCorpus,

    /// Search was attempted against an index with zero entries.
    #[error("vector index is empty")]
    EmptyIndex,

    /// A session operation was invoked in the wrong state.
    #[error("session is not ready: currently {state}")]
    NotReady {
        /// Name of the state the session was in.
        state: &'static str,
    },

    /// The session has been closed; no further operations are possible.
    #[error("session is closed")]
    Closed,

    /// Another `ask` is already in flight on this session.
    #[error("session is busy with another question")]
    Busy,
}

/// Result type alias for conversation pipeline operations.
pub type Result<T> = std::result::Result<T, ChatError>;
