//! DOCX chapter extraction.
//!
//! Chapters are delimited by heading-styled paragraphs. The accumulation
//! loop is generic over [`DocParagraph`] so alternate document backends
//! can be substituted without touching the boundary logic.

use anyhow::{Context, Result};
use docx_rust::DocxFile;
use docx_rust::document::{BodyContent, ParagraphContent, RunContent};
use std::path::Path;

use super::ChapterRecord;

/// Paragraph style names beginning with this mark chapter boundaries
/// ("Heading1", "Heading 2", ...).
const HEADING_STYLE_PREFIX: &str = "heading";

/// A paragraph reduced to what boundary detection needs.
#[derive(Debug, Clone)]
pub struct DocParagraph {
    /// Paragraph style id, if the paragraph carries one
    pub style: Option<String>,
    /// Plain paragraph text
    pub text: String,
}

/// A paragraph starts a new chapter iff it carries a heading-level style
/// and has non-empty text.
pub fn is_chapter_boundary(para: &DocParagraph) -> bool {
    let heading = para
        .style
        .as_deref()
        .map(|s| s.to_ascii_lowercase().starts_with(HEADING_STYLE_PREFIX))
        .unwrap_or(false);
    heading && !para.text.trim().is_empty()
}

/// Extract chapters from a DOCX file.
///
/// Read or parse errors are fatal; there is no partial result for a
/// corrupt document.
pub fn extract_chapters_docx(path: &Path) -> Result<Vec<ChapterRecord>> {
    let file = DocxFile::from_file(path)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to open DOCX: {}", path.display()))?;
    let docx = file
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to parse DOCX content")?;

    let mut paragraphs = Vec::new();
    for content in &docx.document.body.content {
        if let BodyContent::Paragraph(para) = content {
            let style = para
                .property
                .as_ref()
                .and_then(|p| p.style_id.as_ref())
                .map(|s| s.value.to_string());
            paragraphs.push(DocParagraph {
                style,
                text: paragraph_text(para),
            });
        }
    }

    Ok(accumulate_chapters(&paragraphs))
}

/// Fold paragraphs into chapters at heading boundaries.
///
/// If no headings exist anywhere, the whole document becomes a single
/// "Complete Document" chapter with empty paragraphs preserved as blank
/// lines.
pub fn accumulate_chapters(paragraphs: &[DocParagraph]) -> Vec<ChapterRecord> {
    if !paragraphs.iter().any(is_chapter_boundary) {
        let all_text: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        return vec![ChapterRecord {
            title: "Complete Document".to_string(),
            content: all_text.join("\n"),
        }];
    }

    let mut chapters = Vec::new();
    let mut title: Option<String> = None;
    let mut buffer: Vec<String> = Vec::new();

    for para in paragraphs {
        if is_chapter_boundary(para) {
            flush_chapter(&mut chapters, title.take(), &mut buffer);
            title = Some(para.text.trim().to_string());
        } else if !para.text.trim().is_empty() {
            buffer.push(para.text.clone());
        }
    }
    flush_chapter(&mut chapters, title.take(), &mut buffer);

    chapters
}

fn flush_chapter(chapters: &mut Vec<ChapterRecord>, title: Option<String>, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    let content = buffer.join("\n");
    buffer.clear();
    chapters.push(ChapterRecord {
        title: title.unwrap_or_else(|| "Untitled Chapter".to_string()),
        content,
    });
}

fn paragraph_text(para: &docx_rust::document::Paragraph) -> String {
    let mut text = String::new();
    for pc in &para.content {
        match pc {
            ParagraphContent::Run(run) => collect_run_text(run, &mut text),
            ParagraphContent::Link(link) => {
                if let Some(ref run) = link.content {
                    collect_run_text(run, &mut text);
                }
            }
            _ => {}
        }
    }
    text
}

fn collect_run_text(run: &docx_rust::document::Run, out: &mut String) {
    for rc in &run.content {
        match rc {
            RunContent::Text(t) => out.push_str(&t.text),
            RunContent::Break(_) => out.push('\n'),
            RunContent::Tab(_) => out.push('\t'),
            _ => {}
        }
    }
}
