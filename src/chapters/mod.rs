//! Chapter extraction from structured text documents.
//!
//! Each supported format has its own extractor turning a file into an
//! ordered list of [`ChapterRecord`]s. [`extract_chapters`] routes a path
//! to the right extractor by extension.

pub mod docx;
pub mod epub;
pub mod markdown;

use anyhow::Result;
use std::path::Path;

use crate::config::AppConfig;

/// A chapter extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// Chapter title, possibly a generated placeholder
    pub title: String,
    /// Plain text content
    pub content: String,
}

impl ChapterRecord {
    /// Approximate word count of the chapter content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Extract chapters from a document, routing by file extension.
///
/// Unsupported extensions yield an empty list, not an error; the caller
/// decides how to surface that.
pub fn extract_chapters(path: &Path, config: &AppConfig) -> Result<Vec<ChapterRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "docx" => docx::extract_chapters_docx(path),
        "epub" => epub::extract_chapters_epub(path, config),
        "md" | "markdown" => markdown::extract_chapters_markdown(path),
        _ => Ok(Vec::new()),
    }
}
