//! Separator-based text chunking with char-level overlap.

use crate::config::SessionConfig;
use crate::error::{ChatError, Result};
use crate::types::Segment;

/// Splits raw text into overlapping segments sized for embedding.
///
/// Text is first split on the separator into atomic units. Units are
/// accumulated (re-joined by the separator) until the next unit would push
/// the chunk past `chunk_size` chars; the chunk is then emitted and the next
/// one is seeded with the trailing `overlap` chars of the previous chunk so
/// adjacent chunks share context.
///
/// A single unit longer than `chunk_size` is emitted as its own oversized
/// chunk; content is never dropped. Splitting is pure and deterministic, so
/// rebuilding an index from the same text yields identical segments.
///
/// # Example
///
/// ```rust
/// use docchat::chunker::SeparatorChunker;
///
/// let chunker = SeparatorChunker::new(9, 4, " ").unwrap();
/// let segments = chunker.split("AAAA BBBB CCCC");
/// let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
/// assert_eq!(texts, ["AAAA BBBB", "BBBB CCCC"]);
/// ```
#[derive(Debug, Clone)]
pub struct SeparatorChunker {
    chunk_size: usize,
    overlap: usize,
    separator: String,
}

impl SeparatorChunker {
    /// Creates a chunker.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] if `chunk_size` is zero, the
    /// overlap is not smaller than the chunk size, or the separator is empty.
    pub fn new(chunk_size: usize, overlap: usize, separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if chunk_size == 0 {
            return Err(ChatError::Configuration("chunk_size must be > 0".into()));
        }
        if overlap >= chunk_size {
            return Err(ChatError::Configuration(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        if separator.is_empty() {
            return Err(ChatError::Configuration("separator must be non-empty".into()));
        }
        Ok(Self {
            chunk_size,
            overlap,
            separator,
        })
    }

    /// Creates a chunker from session configuration.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] if the configuration is invalid.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.chunk_size,
            config.chunk_overlap,
            config.separator.clone(),
        )
    }

    /// Splits `text` into overlapping segments.
    ///
    /// Offsets in the returned segments are char offsets into `text`. Empty
    /// input (or input consisting only of separators) yields no segments.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Segment> {
        let sep_chars = self.separator.chars().count();
        let mut segments = Vec::new();

        // Chunk under construction. `units` counts real units beyond the
        // overlap seed; a chunk holding only its seed is never emitted.
        let mut current = String::new();
        let mut current_chars = 0usize;
        let mut current_offset = 0usize;
        let mut units = 0usize;

        let mut offset = 0usize;
        for unit in text.split(self.separator.as_str()) {
            let unit_chars = unit.chars().count();
            let unit_offset = offset;
            offset += unit_chars + sep_chars;
            if unit.is_empty() {
                continue;
            }

            if units == 0 && current.is_empty() {
                current.push_str(unit);
                current_chars = unit_chars;
                current_offset = unit_offset;
                units = 1;
                continue;
            }

            let candidate = current_chars + sep_chars + unit_chars;
            if candidate <= self.chunk_size {
                current.push_str(&self.separator);
                current.push_str(unit);
                current_chars = candidate;
                units += 1;
                continue;
            }

            if units > 0 {
                segments.push(Segment::new(current.clone(), current_offset));
                let (tail, tail_chars) = char_tail(&current, self.overlap);
                current_offset = current_offset + current_chars - tail_chars;
                current = tail.to_owned();
                current_chars = tail_chars;
                units = 0;
            }

            // Retry the unit against the seeded chunk; if even the seed plus
            // this unit overflows, drop the seed so the size bound holds.
            let candidate = current_chars + sep_chars + unit_chars;
            if !current.is_empty() && candidate <= self.chunk_size {
                current.push_str(&self.separator);
                current.push_str(unit);
                current_chars = candidate;
            } else {
                current.clear();
                current.push_str(unit);
                current_chars = unit_chars;
                current_offset = unit_offset;
            }
            units = 1;
        }

        if units > 0 {
            segments.push(Segment::new(current, current_offset));
        }
        segments
    }

    /// Maximum chunk size in chars.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap carried between consecutive chunks, in chars.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Returns the suffix of `s` holding at most `n` chars, with its char count.
fn char_tail(s: &str, n: usize) -> (&str, usize) {
    let total = s.chars().count();
    if n == 0 {
        return ("", 0);
    }
    if total <= n {
        return (s, total);
    }
    let skip = total - n;
    let byte_start = s
        .char_indices()
        .nth(skip)
        .map_or(s.len(), |(idx, _)| idx);
    (&s[byte_start..], n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn reference_scenario() {
        let chunker = SeparatorChunker::new(9, 4, " ").unwrap();
        let segments = chunker.split("AAAA BBBB CCCC");
        assert_eq!(texts(&segments), ["AAAA BBBB", "BBBB CCCC"]);
        assert_eq!(segments[0].source_offset, 0);
        assert_eq!(segments[1].source_offset, 5);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let chunker = SeparatorChunker::new(10, 2, "\n").unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("\n\n\n").is_empty());
    }

    #[test]
    fn oversized_unit_emitted_whole() {
        let chunker = SeparatorChunker::new(5, 2, " ").unwrap();
        let segments = chunker.split("aa abcdefghij bb");
        assert!(segments.iter().any(|s| s.text == "abcdefghij"));
        // Nothing dropped: every unit appears in some chunk.
        for unit in ["aa", "abcdefghij", "bb"] {
            assert!(segments.iter().any(|s| s.text.contains(unit)));
        }
    }

    #[test]
    fn chunks_respect_size_bound_except_oversized_units() {
        let chunker = SeparatorChunker::new(20, 5, " ").unwrap();
        let text = "the quick brown fox jumps over a verylongunitthatwontfit lazy dog repeatedly";
        for segment in chunker.split(text) {
            let chars = segment.text.chars().count();
            let single_oversized =
                !segment.text.contains(' ') && chars > chunker.chunk_size();
            assert!(chars <= 20 || single_oversized, "chunk too big: {segment:?}");
        }
    }

    #[test]
    fn overlap_prefix_is_suffix_of_previous_chunk() {
        let chunker = SeparatorChunker::new(25, 8, " ").unwrap();
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let segments = chunker.split(text);
        assert!(segments.len() > 1);
        for pair in segments.windows(2) {
            let prev: String = pair[0].text.chars().rev().take(8).collect();
            let seed: String = prev.chars().rev().collect();
            assert!(
                pair[1].text.starts_with(&seed),
                "`{}` does not start with `{seed}`",
                pair[1].text
            );
        }
    }

    #[test]
    fn stripping_overlap_reconstructs_unit_sequence() {
        let chunker = SeparatorChunker::new(25, 8, " ").unwrap();
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let segments = chunker.split(text);

        let mut rebuilt = segments[0].text.clone();
        for pair in segments.windows(2) {
            let seed: String = {
                let tail: String = pair[0].text.chars().rev().take(8).collect();
                tail.chars().rev().collect()
            };
            let fresh = &pair[1].text[seed.len()..];
            rebuilt.push_str(fresh);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn segment_text_is_substring_at_offset() {
        let chunker = SeparatorChunker::new(25, 8, " ").unwrap();
        let text = "one two three four five six seven eight nine ten eleven twelve";
        for segment in chunker.split(text) {
            let window: String = text
                .chars()
                .skip(segment.source_offset)
                .take(segment.text.chars().count())
                .collect();
            assert_eq!(window, segment.text);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let chunker = SeparatorChunker::new(30, 10, "\n").unwrap();
        let text = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\neta\ntheta";
        assert_eq!(chunker.split(text), chunker.split(text));
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        assert!(matches!(
            SeparatorChunker::new(10, 10, " ").unwrap_err(),
            ChatError::Configuration(_)
        ));
        assert!(matches!(
            SeparatorChunker::new(0, 0, " ").unwrap_err(),
            ChatError::Configuration(_)
        ));
        assert!(matches!(
            SeparatorChunker::new(10, 2, "").unwrap_err(),
            ChatError::Configuration(_)
        ));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunker = SeparatorChunker::new(8, 3, " ").unwrap();
        let segments = chunker.split("héllø wörld ünïts here");
        assert!(!segments.is_empty());
        for pair in segments.windows(2) {
            assert!(pair[0].source_offset < pair[1].source_offset);
        }
    }
}
