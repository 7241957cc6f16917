//! Bounded prompt assembly from retrieved chunks and history.

use serde::{Deserialize, Serialize};

use crate::memory::{Role, Turn};
use crate::types::SearchResult;

/// Instructions handed to the generator with every question.
///
/// The generator is told to answer only from the supplied context, to say so
/// when the context is insufficient, and not to fabricate.
pub const SYSTEM_PREAMBLE: &str = "You are a helpful assistant answering questions about documents \
the user has provided. Use only the retrieved context below to answer. If the context does not \
contain the information needed, reply that you do not have enough information to answer. Do not \
make up an answer.";

/// Everything the generation collaborator needs for one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledPrompt {
    /// Standing instructions for the generator.
    pub system_preamble: String,
    /// Retrieved chunk texts, concatenated within the char budget.
    pub context_block: String,
    /// Conversation history, passed through unmodified.
    pub history: Vec<Turn>,
    /// The user's current question.
    pub question: String,
}

impl AssembledPrompt {
    /// Flattens the prompt into a single string for plain-text generators.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.system_preamble.len() + self.context_block.len() + self.question.len() + 64,
        );
        out.push_str(&self.system_preamble);
        out.push_str("\n\nContext:\n");
        out.push_str(&self.context_block);
        for turn in &self.history {
            out.push('\n');
            out.push_str(match turn.role {
                Role::User => "User: ",
                Role::Assistant => "Assistant: ",
            });
            out.push_str(&turn.content);
        }
        out.push_str("\nUser: ");
        out.push_str(&self.question);
        out
    }
}

/// Merges retrieved chunks and history into a bounded prompt.
///
/// Chunk texts are concatenated in the given (already ranked) order,
/// separated by a blank line, until the next chunk would push the char count
/// past the budget. Truncation happens only at chunk boundaries and always
/// drops the lowest-ranked chunks; the kept chunks are a prefix of the
/// ranking. History is never truncated here.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_context_chars: usize,
}

const CHUNK_SEPARATOR: &str = "\n\n";

impl ContextAssembler {
    /// Creates an assembler with the given context budget in chars.
    #[must_use]
    pub const fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Char budget for the context block.
    #[must_use]
    pub const fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Builds the prompt for one question.
    #[must_use]
    pub fn assemble(
        &self,
        question: &str,
        retrieved: &[SearchResult],
        history: &[Turn],
    ) -> AssembledPrompt {
        let sep_chars = CHUNK_SEPARATOR.chars().count();
        let mut context_block = String::new();
        let mut used = 0usize;

        for hit in retrieved {
            let chunk_chars = hit.chunk.text.chars().count();
            let cost = if context_block.is_empty() {
                chunk_chars
            } else {
                sep_chars + chunk_chars
            };
            if used + cost > self.max_context_chars {
                break;
            }
            if !context_block.is_empty() {
                context_block.push_str(CHUNK_SEPARATOR);
            }
            context_block.push_str(&hit.chunk.text);
            used += cost;
        }

        AssembledPrompt {
            system_preamble: SYSTEM_PREAMBLE.to_owned(),
            context_block,
            history: history.to_vec(),
            question: question.to_owned(),
        }
    }
}
