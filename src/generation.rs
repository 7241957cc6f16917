//! Generation collaborator interface.

use core::future::Future;

use crate::assembler::AssembledPrompt;

/// Produces an answer from an assembled prompt.
///
/// Failures (rate limit, timeout, malformed request) surface as
/// [`ChatError::Generation`](crate::ChatError::Generation) with the
/// underlying cause preserved; the session leaves memory untouched so the
/// caller may retry the same question.
pub trait TextGenerator: Send + Sync {
    /// Generates an answer for `prompt`.
    fn generate(&self, prompt: &AssembledPrompt)
    -> impl Future<Output = anyhow::Result<String>> + Send;
}
