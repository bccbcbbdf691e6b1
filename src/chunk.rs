//! Text chunking for speech synthesis
//!
//! TTS requests have payload limits, and smaller chunks reach first audio
//! sooner when synthesis is streamed. This module splits speakable text into
//! bounded segments under one of two policies: fixed-size slices for
//! whole-payload synthesis, or sentence groups for streamed synthesis.

/// Chunk budget for whole-payload synthesis
pub const FLAT_CHUNK_LIMIT: usize = 10_000;

/// Chunk budget for sentence-grouped streaming synthesis
pub const SENTENCE_GROUP_LIMIT: usize = 250;

/// Policy for splitting speakable text into synthesis-safe segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Fixed-size slices with no regard for word or sentence boundaries
    Flat {
        /// Maximum characters per chunk
        limit: usize,
    },
    /// Sentences packed greedily into groups up to a character budget.
    /// A single sentence that alone exceeds the budget becomes its own
    /// group rather than being split further.
    Sentences {
        /// Maximum characters per group
        max_chars: usize,
    },
}

impl ChunkPolicy {
    /// Flat policy at the default budget
    #[must_use]
    pub const fn flat() -> Self {
        Self::Flat {
            limit: FLAT_CHUNK_LIMIT,
        }
    }

    /// Sentence-grouping policy at the default budget
    #[must_use]
    pub const fn sentences() -> Self {
        Self::Sentences {
            max_chars: SENTENCE_GROUP_LIMIT,
        }
    }
}

/// Split `text` into chunks under the given policy.
///
/// Every returned chunk is non-empty; empty input yields no chunks.
/// Concatenating the chunks (joined with single spaces for the sentence
/// policy) reproduces the input modulo whitespace normalization.
#[must_use]
pub fn chunk_text(text: &str, policy: ChunkPolicy) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    match policy {
        ChunkPolicy::Flat { limit } => chunk_flat(text, limit),
        ChunkPolicy::Sentences { max_chars } => {
            group_sentences(&split_into_sentences(text), max_chars)
        }
    }
}

/// Fixed-size slicing, splitting only at char boundaries.
fn chunk_flat(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= limit {
            chunks.push(remaining.to_string());
            break;
        }

        let mut split = limit;
        while split > 0 && !remaining.is_char_boundary(split) {
            split -= 1;
        }
        chunks.push(remaining[..split].to_string());
        remaining = &remaining[split..];
    }

    chunks
}

/// Split text into sentences after `.`, `!`, or `?` followed by whitespace.
///
/// The punctuation stays attached to the preceding sentence; the separating
/// whitespace is consumed (groups are rejoined with single spaces).
#[must_use]
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        let boundary =
            matches!(bytes[i], b'.' | b'!' | b'?') && bytes[i + 1].is_ascii_whitespace();

        if boundary {
            let sentence = &text[start..=i];
            if !sentence.trim().is_empty() {
                sentences.push(sentence);
            }
            // Skip the whitespace run after the terminator
            let mut next = i + 1;
            while next < bytes.len() && bytes[next].is_ascii_whitespace() {
                next += 1;
            }
            start = next;
            i = next;
        } else {
            i += 1;
        }
    }

    if start < text.len() {
        let tail = &text[start..];
        if !tail.trim().is_empty() {
            sentences.push(tail);
        }
    }

    sentences
}

/// Greedily pack sentences into groups within `max_chars`.
///
/// The joining space counts toward the budget. A sentence that alone exceeds
/// the budget becomes its own group.
fn group_sentences(sentences: &[&str], max_chars: usize) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    let mut current = String::new();

    for &sentence in sentences {
        let needed = if current.is_empty() {
            sentence.len()
        } else {
            current.len() + 1 + sentence.len()
        };

        if needed > max_chars && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }

        if current.is_empty() {
            current.push_str(sentence);
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- flat policy ----

    #[test]
    fn empty_input_returns_no_chunks() {
        assert!(chunk_text("", ChunkPolicy::flat()).is_empty());
        assert!(chunk_text("", ChunkPolicy::sentences()).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("Hello, world!", ChunkPolicy::flat());
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn flat_splits_at_exact_boundaries() {
        let text = "a".repeat(12_000);
        let chunks = chunk_text(&text, ChunkPolicy::flat());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 10_000);
        assert_eq!(chunks[1].len(), 2_000);
    }

    #[test]
    fn flat_concatenation_reproduces_input() {
        let text = "The quick brown fox. ".repeat(40);
        let chunks = chunk_text(&text, ChunkPolicy::Flat { limit: 100 });
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn flat_respects_char_boundaries() {
        // Each emoji is 4 bytes; a 6-byte limit cannot split one in half
        let text = "\u{1F600}\u{1F601}\u{1F602}";
        let chunks = chunk_text(text, ChunkPolicy::Flat { limit: 6 });
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
        }
    }

    // ---- sentence splitting ----

    #[test]
    fn splits_after_terminator_and_whitespace() {
        let sentences = split_into_sentences("Hello. World! Test? Done");
        assert_eq!(sentences, vec!["Hello.", "World!", "Test?", "Done"]);
    }

    #[test]
    fn terminator_without_trailing_space_does_not_split() {
        let sentences = split_into_sentences("Version 2.5 is out. Install it.");
        assert_eq!(sentences, vec!["Version 2.5 is out.", "Install it."]);
    }

    #[test]
    fn lone_sentence_without_terminator() {
        assert_eq!(split_into_sentences("no punctuation here"), vec![
            "no punctuation here"
        ]);
    }

    // ---- sentence grouping ----

    #[test]
    fn groups_pack_up_to_budget() {
        let text = "One. Two. Three. Four.";
        let chunks = chunk_text(text, ChunkPolicy::Sentences { max_chars: 11 });
        // "One. Two." is 9 chars, adding " Three." would exceed 11
        assert_eq!(chunks, vec!["One. Two.", "Three.", "Four."]);
    }

    #[test]
    fn groups_never_exceed_budget_except_oversized_sentence() {
        let text = "Short one. This sentence is much longer than the budget allows. End.";
        let chunks = chunk_text(text, ChunkPolicy::Sentences { max_chars: 20 });
        for chunk in &chunks {
            let is_single_sentence = split_into_sentences(chunk).len() == 1;
            assert!(
                chunk.len() <= 20 || is_single_sentence,
                "multi-sentence chunk over budget: {chunk:?}"
            );
        }
    }

    #[test]
    fn oversized_sentence_becomes_own_group() {
        let long = "x".repeat(400);
        let text = format!("Intro. {long}. Outro.");
        let chunks = chunk_text(&text, ChunkPolicy::sentences());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "Intro.");
        assert_eq!(chunks[1].len(), 401);
        assert_eq!(chunks[2], "Outro.");
    }

    #[test]
    fn sentence_chunks_rejoin_to_input() {
        let text = "First sentence. Second one! A third? And the last.";
        let chunks = chunk_text(text, ChunkPolicy::Sentences { max_chars: 25 });
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn multiple_spaces_normalize_to_single() {
        let text = "One.  Two.   Three.";
        let chunks = chunk_text(text, ChunkPolicy::Sentences { max_chars: 250 });
        assert_eq!(chunks, vec!["One. Two. Three."]);
    }
}
