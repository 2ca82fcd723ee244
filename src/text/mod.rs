//! Text processing for TTS: segmentation, cleaning, chunk identity.

pub mod cleaner;
pub mod segmenter;

pub use cleaner::clean_text;

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The chapter this chunk belongs to
    pub chapter_id: usize,
    /// The chunk index within the chapter
    pub chunk_id: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    pub fn new(chapter_id: usize, chunk_id: usize, text: String) -> Self {
        Self {
            chapter_id,
            chunk_id,
            text,
        }
    }
}

/// Segment a chapter's text into ordered, TTS-ready chunks.
///
/// If segmentation yields nothing for non-empty text, fixed-width slicing
/// of the raw text is the last line of defense. Chunk text is cleaned for
/// synthesis after segmentation.
pub fn process_chapter(chapter_id: usize, text: &str, chunk_size: usize) -> Vec<TextChunk> {
    let mut chunks = segmenter::segment(text, chunk_size);
    if chunks.is_empty() && !text.trim().is_empty() {
        chunks = fixed_width_chunks(text, chunk_size);
    }

    chunks
        .into_iter()
        .map(|chunk| clean_text(&chunk))
        .filter(|chunk| !chunk.is_empty())
        .enumerate()
        .map(|(chunk_id, text)| TextChunk::new(chapter_id, chunk_id, text))
        .collect()
}

/// Slice text into fixed-width chunks at character granularity.
fn fixed_width_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = std::cmp::min(start + size, chars.len());
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }

    chunks
}
