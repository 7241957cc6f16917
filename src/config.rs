//! Configuration for the conversation pipeline.

use crate::error::{ChatError, Result};

/// Configuration shared by ingestion and sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum chunk size in chars.
    pub chunk_size: usize,
    /// Chars of overlap carried between consecutive chunks.
    pub chunk_overlap: usize,
    /// Separator the chunker splits on.
    pub separator: String,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Char budget for the assembled context block.
    pub max_context_chars: usize,
    /// Maximum embedding calls in flight during index build.
    pub embed_concurrency: usize,
    /// When set, only the most recent N turns are passed to the generator.
    ///
    /// Memory itself is unbounded either way; this only bounds the prompt.
    pub history_window: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separator: "\n".to_owned(),
            top_k: 3,
            max_context_chars: 4000,
            embed_concurrency: 8,
            history_window: None,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Checks the configuration for contract violations.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] if `chunk_size` is zero, the
    /// overlap is not smaller than the chunk size, the separator is empty,
    /// or the embedding concurrency is zero.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChatError::Configuration("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChatError::Configuration(format!(
                "overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separator.is_empty() {
            return Err(ChatError::Configuration("separator must be non-empty".into()));
        }
        if self.embed_concurrency == 0 {
            return Err(ChatError::Configuration(
                "embed_concurrency must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Creates a builder seeded with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Sets the maximum chunk size in chars.
    #[must_use]
    pub const fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    /// Sets the overlap carried between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(mut self, chars: usize) -> Self {
        self.config.chunk_overlap = chars;
        self
    }

    /// Sets the separator the chunker splits on.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    /// Sets the number of chunks retrieved per question.
    #[must_use]
    pub const fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Sets the char budget for the assembled context block.
    #[must_use]
    pub const fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Sets the maximum number of in-flight embedding calls during build.
    #[must_use]
    pub const fn embed_concurrency(mut self, width: usize) -> Self {
        self.config.embed_concurrency = width;
        self
    }

    /// Bounds how many recent turns reach the generator.
    #[must_use]
    pub const fn history_window(mut self, turns: usize) -> Self {
        self.config.history_window = Some(turns);
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] for the violations listed on
    /// [`SessionConfig::validate`].
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
