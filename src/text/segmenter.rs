//! Sentence-aware text segmentation.
//!
//! Sentences are packed greedily into chunks of at most `chunk_size`
//! characters. Size is a soft bound: a single sentence longer than the
//! limit is emitted intact rather than split mid-sentence.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

/// Splits text into sentences. `separator` is what [`segment_with`]
/// inserts between sentences when packing them back into chunks.
pub trait SentenceSplitter {
    fn separator(&self) -> &'static str;

    /// `None` means the splitter is unavailable or failed; the caller
    /// degrades to the regex baseline.
    fn split(&self, text: &str) -> Option<Vec<String>>;
}

/// Dialog-aware splitter backed by the seams sentence detector.
///
/// Sentences come back normalized, so chunks are rebuilt with a single
/// space between sentences.
pub struct DialogSplitter;

static DETECTOR: OnceLock<Option<SentenceDetectorDialog>> = OnceLock::new();

fn detector() -> Option<&'static SentenceDetectorDialog> {
    DETECTOR
        .get_or_init(|| SentenceDetectorDialog::new().ok())
        .as_ref()
}

impl SentenceSplitter for DialogSplitter {
    fn separator(&self) -> &'static str {
        " "
    }

    fn split(&self, text: &str) -> Option<Vec<String>> {
        let detector = detector()?;
        let sentences = detector.detect_sentences_borrowed(text).ok()?;
        Some(
            sentences
                .iter()
                .map(|s| s.normalize())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// Baseline splitter: `[.!?]` followed by whitespace or end of input.
///
/// Always available. Returns exact input slices (boundary whitespace
/// included), so rejoining with the empty separator reconstructs the
/// input losslessly. Abbreviations and ellipses get no special handling;
/// that is a known limitation of the heuristic.
pub struct RegexSplitter;

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?](?:\s+|$)").unwrap());

impl SentenceSplitter for RegexSplitter {
    fn separator(&self) -> &'static str {
        ""
    }

    fn split(&self, text: &str) -> Option<Vec<String>> {
        let mut sentences = Vec::new();
        let mut last_end = 0;

        for boundary in SENTENCE_END_RE.find_iter(text) {
            sentences.push(text[last_end..boundary.end()].to_string());
            last_end = boundary.end();
        }
        // Trailing partial text after the last matched boundary
        if last_end < text.len() {
            sentences.push(text[last_end..].to_string());
        }

        Some(sentences)
    }
}

/// Split `text` into chunks of at most `chunk_size` characters without
/// breaking sentences, preferring the dialog-aware detector and silently
/// degrading to the regex baseline. Never fails.
pub fn segment(text: &str, chunk_size: usize) -> Vec<String> {
    match DialogSplitter.split(text) {
        Some(sentences) => pack_sentences(&sentences, DialogSplitter.separator(), chunk_size),
        None => {
            debug!("sentence detector unavailable, using regex boundaries");
            segment_with(&RegexSplitter, text, chunk_size)
        }
    }
}

/// [`segment`] with an explicit splitter.
pub fn segment_with(splitter: &dyn SentenceSplitter, text: &str, chunk_size: usize) -> Vec<String> {
    let sentences = match splitter.split(text) {
        Some(sentences) => sentences,
        None => RegexSplitter.split(text).unwrap_or_default(),
    };
    pack_sentences(&sentences, splitter.separator(), chunk_size)
}

/// Greedy packing: close the running chunk when appending the next
/// sentence would overflow and the chunk is non-empty.
fn pack_sentences(sentences: &[String], separator: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let appended_len = if current.is_empty() {
            sentence.len()
        } else {
            current.len() + separator.len() + sentence.len()
        };

        if appended_len > chunk_size && !current.is_empty() {
            chunks.push(current);
            current = sentence.clone();
        } else {
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(segment("", 1000).is_empty());
        assert!(segment_with(&RegexSplitter, "", 1000).is_empty());
    }

    #[test]
    fn test_single_sentence_under_limit() {
        assert_eq!(segment("Hello world.", 1000), vec!["Hello world."]);
    }

    #[test]
    fn test_no_terminal_punctuation_is_one_chunk() {
        let chunks = segment_with(&RegexSplitter, "no punctuation here at all", 1000);
        assert_eq!(chunks, vec!["no punctuation here at all"]);
    }

    #[test]
    fn test_regex_splitter_keeps_exact_slices() {
        let text = "One. Two!  Three? tail";
        let sentences = RegexSplitter.split(text).unwrap();
        assert_eq!(sentences.concat(), text);
        assert_eq!(sentences.len(), 4);
    }

    #[test]
    fn test_packing_respects_chunk_size() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence.";
        let chunks = segment_with(&RegexSplitter, text, 35);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 35, "chunk too long: {:?}", chunk);
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_oversized_sentence_kept_intact() {
        let long = "word ".repeat(30).trim_end().to_string() + ".";
        let text = format!("Short one. {} Short two.", long);
        let chunks = segment_with(&RegexSplitter, &text, 50);
        // The long sentence overflows the limit but is never split
        assert!(chunks.iter().any(|c| c.len() > 50));
        assert!(chunks.iter().any(|c| c.contains("word word")));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_dialog_splitter_sentence_count() {
        let sentences = DialogSplitter.split("First sentence. Second sentence.").unwrap();
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }

    #[test]
    fn test_trailing_fragment_joins_final_chunk() {
        let text = "A full sentence. trailing fragment";
        let chunks = segment_with(&RegexSplitter, text, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    proptest! {
        #[test]
        fn prop_regex_segmentation_is_lossless(
            text in "[ -~]{0,400}",
            chunk_size in 1usize..200,
        ) {
            let chunks = segment_with(&RegexSplitter, &text, chunk_size);
            prop_assert_eq!(chunks.concat(), text);
        }

        #[test]
        fn prop_chunks_respect_soft_bound(
            text in "[ -~]{0,400}",
            chunk_size in 1usize..200,
        ) {
            let sentences = RegexSplitter.split(&text).unwrap();
            let chunks = segment_with(&RegexSplitter, &text, chunk_size);
            for chunk in &chunks {
                // Oversized chunks must be exactly one unsplittable sentence
                prop_assert!(
                    chunk.len() <= chunk_size || sentences.contains(chunk),
                    "oversized multi-sentence chunk: {:?}",
                    chunk
                );
            }
        }

        #[test]
        fn prop_empty_only_for_empty_input(text in "[ -~]{1,200}") {
            let chunks = segment_with(&RegexSplitter, &text, 64);
            prop_assert!(!chunks.is_empty());
        }
    }
}
