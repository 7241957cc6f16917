//! Corpus ingestion: extract, chunk, embed, index.

use tracing::{debug, info};

use crate::chunker::SeparatorChunker;
use crate::config::SessionConfig;
use crate::embedding::EmbeddingModel;
use crate::error::{ChatError, Result};
use crate::extraction::{SourceDocument, TextExtractor};
use crate::index::VectorIndex;

/// Per-document ingestion outcome.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Document name.
    pub name: String,
    /// What happened to it.
    pub status: DocumentStatus,
}

/// Status of one document after ingestion.
#[derive(Debug)]
pub enum DocumentStatus {
    /// Text was extracted and contributed to the corpus.
    Extracted {
        /// Chars of text the document contributed.
        chars: usize,
    },
    /// Extraction failed; the document was skipped.
    Failed(ChatError),
}

/// Aggregated result of ingesting a corpus.
#[derive(Debug)]
pub struct IngestionReport {
    /// One outcome per input document, in input order.
    pub outcomes: Vec<DocumentOutcome>,
    /// Number of chunks indexed.
    pub chunk_count: usize,
}

impl IngestionReport {
    /// Number of documents whose text made it into the index.
    #[must_use]
    pub fn extracted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, DocumentStatus::Extracted { .. }))
            .count()
    }

    /// Number of documents skipped due to extraction failures.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.extracted()
    }
}

/// Progress update emitted during ingestion.
#[derive(Debug, Clone)]
pub struct IngestProgress {
    /// Documents processed so far.
    pub processed: usize,
    /// Total documents in the batch.
    pub total: usize,
    /// Current document name (if applicable).
    pub document: Option<String>,
    /// Current stage.
    pub stage: IngestStage,
}

/// Stages of the ingestion process.
#[derive(Debug, Clone)]
pub enum IngestStage {
    /// Extracting text from the current document.
    Extracting,
    /// Splitting the combined corpus into chunks.
    Chunking,
    /// Embedding chunks and building the index.
    Embedding,
    /// Ingestion completed.
    Done,
    /// Document was skipped due to an extraction error.
    Skipped {
        /// Why the document was skipped.
        reason: String,
    },
}

/// Builds a [`VectorIndex`] from raw documents.
///
/// The texts of all successfully extracted documents are concatenated (in
/// input order, separator-joined) and chunked as one corpus, so chunks may
/// span document boundaries exactly once per adjacent pair. One failing
/// document never aborts the rest; failures are reported per document in
/// the [`IngestionReport`].
#[derive(Debug, Clone)]
pub struct Ingestor {
    chunker: SeparatorChunker,
    separator: String,
    embed_concurrency: usize,
}

impl Ingestor {
    /// Creates an ingestor from session configuration.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] if the configuration is invalid.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            chunker: SeparatorChunker::from_config(config)?,
            separator: config.separator.clone(),
            embed_concurrency: config.embed_concurrency,
        })
    }

    /// Ingests `documents` and builds the corpus index.
    ///
    /// # Errors
    /// [`ChatError::EmptyCorpus`] if no document yielded text, plus any
    /// [`VectorIndex::build`] error. Extraction failures are reported, not
    /// returned.
    pub async fn ingest<X, M>(
        &self,
        documents: &[SourceDocument],
        extractor: &X,
        embedder: &M,
    ) -> Result<(VectorIndex, IngestionReport)>
    where
        X: TextExtractor,
        M: EmbeddingModel,
    {
        self.ingest_with_progress(documents, extractor, embedder, |_| {})
            .await
    }

    /// Like [`Ingestor::ingest`], reporting progress through a callback.
    ///
    /// # Errors
    /// See [`Ingestor::ingest`].
    pub async fn ingest_with_progress<X, M, F>(
        &self,
        documents: &[SourceDocument],
        extractor: &X,
        embedder: &M,
        mut on_progress: F,
    ) -> Result<(VectorIndex, IngestionReport)>
    where
        X: TextExtractor,
        M: EmbeddingModel,
        F: FnMut(IngestProgress),
    {
        let total = documents.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut corpus = String::new();

        for (idx, document) in documents.iter().enumerate() {
            on_progress(IngestProgress {
                processed: idx,
                total,
                document: Some(document.name.clone()),
                stage: IngestStage::Extracting,
            });

            match extractor.extract(document).await {
                Ok(text) => {
                    let chars = text.chars().count();
                    if !corpus.is_empty() {
                        corpus.push_str(&self.separator);
                    }
                    corpus.push_str(&text);
                    debug!(document = %document.name, chars, "extracted");
                    outcomes.push(DocumentOutcome {
                        name: document.name.clone(),
                        status: DocumentStatus::Extracted { chars },
                    });
                }
                Err(source) => {
                    let error = ChatError::Extraction {
                        document: document.name.clone(),
                        source,
                    };
                    on_progress(IngestProgress {
                        processed: idx,
                        total,
                        document: Some(document.name.clone()),
                        stage: IngestStage::Skipped {
                            reason: error.to_string(),
                        },
                    });
                    outcomes.push(DocumentOutcome {
                        name: document.name.clone(),
                        status: DocumentStatus::Failed(error),
                    });
                }
            }
        }

        on_progress(IngestProgress {
            processed: total,
            total,
            document: None,
            stage: IngestStage::Chunking,
        });
        let segments = self.chunker.split(&corpus);
        if segments.is_empty() {
            return Err(ChatError::EmptyCorpus);
        }

        on_progress(IngestProgress {
            processed: total,
            total,
            document: None,
            stage: IngestStage::Embedding,
        });
        let chunk_count = segments.len();
        let index =
            VectorIndex::build_with_concurrency(segments, embedder, self.embed_concurrency).await?;

        on_progress(IngestProgress {
            processed: total,
            total,
            document: None,
            stage: IngestStage::Done,
        });

        let report = IngestionReport {
            outcomes,
            chunk_count,
        };
        info!(
            documents = total,
            extracted = report.extracted(),
            chunk_count,
            "corpus ingested"
        );
        Ok((index, report))
    }
}
