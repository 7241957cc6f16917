//! Text-extraction collaborator interface.

use core::future::Future;

/// One raw input document handed to ingestion.
///
/// The pipeline never interprets the payload itself; format-specific parsing
/// (PDF, HTML, ...) lives behind [`TextExtractor`].
#[derive(Clone, Debug)]
pub struct SourceDocument {
    /// Display name used in reports and error messages.
    pub name: String,
    /// Raw document payload.
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Creates a source document.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Extracts the full text of one document.
///
/// Failures are reported per document; ingestion skips the failing document
/// and continues with the rest of the corpus.
pub trait TextExtractor: Send + Sync {
    /// Returns the full text of `document`.
    fn extract(&self, document: &SourceDocument)
    -> impl Future<Output = anyhow::Result<String>> + Send;
}
