//! Conversational retrieval-augmented question answering over document corpora.
//!
//! `docchat` turns a pile of documents into something you can talk to: text
//! is split into overlapping chunks, embedded, and indexed; each question
//! retrieves the most similar chunks, assembles a bounded prompt around them
//! and the conversation so far, and hands it to a text-generation model.
//!
//! The crate is an in-process library boundary. Three collaborators are
//! consumed as traits and never implemented here:
//! - [`TextExtractor`] – raw text out of format-specific payloads (PDF, ...)
//! - [`EmbeddingModel`] – text to fixed-length vectors
//! - [`TextGenerator`] – assembled prompt to answer text
//!
//! # Pipeline
//!
//! Ingestion runs once per corpus ([`Ingestor`] → [`VectorIndex`]); each
//! question flows through retrieval, context assembly, and generation inside
//! a [`ConversationSession`], which owns the multi-turn state.
//!
//! ```rust
//! use std::sync::Arc;
//! use docchat::{
//!     AssembledPrompt, ConversationSession, EmbeddingModel, Ingestor, SessionConfig,
//!     SourceDocument, TextExtractor, TextGenerator,
//! };
//!
//! struct Utf8Extractor;
//!
//! impl TextExtractor for Utf8Extractor {
//!     async fn extract(&self, doc: &SourceDocument) -> anyhow::Result<String> {
//!         Ok(String::from_utf8(doc.bytes.clone())?)
//!     }
//! }
//!
//! struct ToyEmbedder;
//!
//! impl EmbeddingModel for ToyEmbedder {
//!     fn dim(&self) -> usize {
//!         2
//!     }
//!     async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
//!         let solar = text.matches("solar").count() as f32;
//!         Ok(vec![solar + 1.0, text.len() as f32])
//!     }
//! }
//!
//! struct ToyGenerator;
//!
//! impl TextGenerator for ToyGenerator {
//!     async fn generate(&self, prompt: &AssembledPrompt) -> anyhow::Result<String> {
//!         Ok(format!("Based on the context: {}", prompt.context_block))
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let config = SessionConfig::builder()
//!     .chunk_size(60)
//!     .chunk_overlap(12)
//!     .build()?;
//!
//! let docs = [SourceDocument::new(
//!     "notes.txt",
//!     "solar panels convert sunlight into power\nwind turbines spin".as_bytes().to_vec(),
//! )];
//! let ingestor = Ingestor::new(&config)?;
//! let (index, report) = ingestor.ingest(&docs, &Utf8Extractor, &ToyEmbedder).await?;
//! assert_eq!(report.extracted(), 1);
//!
//! let session = ConversationSession::with_config(ToyEmbedder, ToyGenerator, &config)?;
//! session.attach_index(Arc::new(index))?;
//! let answer = session.ask("how do solar panels work?").await?;
//! assert!(!answer.sources.is_empty());
//! # Ok::<(), docchat::ChatError>(())
//! # }).unwrap();
//! ```
//!
//! # Concurrency
//!
//! A built [`VectorIndex`] is immutable and `Arc`-shared across sessions;
//! searches need no locking. A session serializes its own `ask` calls (a
//! second concurrent call fails fast with [`ChatError::Busy`]), and commits
//! both turns of an exchange atomically, so cancellation or generator
//! failure never corrupts memory.

pub mod assembler;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod retriever;
pub mod session;
pub mod types;

pub use assembler::{AssembledPrompt, ContextAssembler, SYSTEM_PREAMBLE};
pub use chunker::SeparatorChunker;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use embedding::EmbeddingModel;
pub use error::{ChatError, Result};
pub use extraction::{SourceDocument, TextExtractor};
pub use generation::TextGenerator;
pub use index::VectorIndex;
pub use ingest::{
    DocumentOutcome, DocumentStatus, IngestProgress, IngestStage, IngestionReport, Ingestor,
};
pub use memory::{ConversationMemory, Role, Turn};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use session::{Answer, ConversationSession, SessionState};
pub use types::{Chunk, IndexEntry, SearchResult, Segment};
