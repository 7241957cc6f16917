//! Ordered multi-turn conversation history.

use serde::{Deserialize, Serialize};

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Input from the human user.
    User,
    /// Response from the assistant.
    Assistant,
}

/// One message in a conversation's ordered history.
///
/// Immutable once appended; `timestamp` is a per-memory monotonic counter,
/// not wall-clock time, so ordering is exact even for rapid exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Monotonic sequence number within the owning memory.
    pub timestamp: u64,
}

/// Append-only log of turns for one session.
///
/// No upper bound is imposed here; bounding what reaches the prompt is the
/// assembler's and session's job. Unbounded growth across a long session is
/// an accepted trade-off (see `SessionConfig::history_window` for the
/// opt-in prompt-side bound).
#[derive(Debug, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
    clock: u64,
}

impl ConversationMemory {
    /// Creates an empty memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turns: Vec::new(),
            clock: 0,
        }
    }

    /// Appends a turn, stamping it with the next counter value.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        let timestamp = self.clock;
        self.clock += 1;
        self.turns.push(Turn {
            role,
            content: content.into(),
            timestamp,
        });
    }

    /// Returns an owned snapshot of the history.
    ///
    /// The snapshot is safe to iterate while the live log is appended to.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Number of turns recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turns have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Resets the log and the counter to empty.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.clock = 0;
    }
}
