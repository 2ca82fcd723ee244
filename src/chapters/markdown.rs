//! Markdown chapter extraction.
//!
//! Tier 1 splits on level 1-2 headings, tier 2 on textual markers like
//! "Chapter 3", tier 3 yields the whole file as one chapter.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::ChapterRecord;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,2}[ \t]+(.+)$").unwrap());

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^(?:chapter|part|book)[ \t]+\d+\b.*$").unwrap());

/// Extract chapters from a Markdown file.
pub fn extract_chapters_markdown(path: &Path) -> Result<Vec<ChapterRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read Markdown file: {}", path.display()))?;
    Ok(chapters_from_text(&text))
}

/// Marker position inside the source text: span of the marker line plus
/// its title text.
struct Marker {
    start: usize,
    end: usize,
    title: String,
}

pub fn chapters_from_text(text: &str) -> Vec<ChapterRecord> {
    let headings: Vec<Marker> = HEADING_RE
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            Marker {
                start: whole.start(),
                end: whole.end(),
                title: cap[1].trim().to_string(),
            }
        })
        .collect();
    if !headings.is_empty() {
        return windowed_chapters(text, &headings);
    }

    let markers: Vec<Marker> = MARKER_RE
        .find_iter(text)
        .map(|m| Marker {
            start: m.start(),
            end: m.end(),
            title: m.as_str().trim().to_string(),
        })
        .collect();
    if !markers.is_empty() {
        return windowed_chapters(text, &markers);
    }

    vec![ChapterRecord {
        title: "Complete Document".to_string(),
        content: text.to_string(),
    }]
}

/// Each marker starts a chapter running to the start of the next marker
/// or end of file.
fn windowed_chapters(text: &str, markers: &[Marker]) -> Vec<ChapterRecord> {
    let mut chapters = Vec::new();

    for (i, marker) in markers.iter().enumerate() {
        let window_end = markers.get(i + 1).map(|m| m.start).unwrap_or(text.len());
        let content = text[marker.end..window_end].trim().to_string();
        if content.is_empty() {
            continue;
        }
        let title = if marker.title.is_empty() {
            format!("Chapter {}", chapters.len() + 1)
        } else {
            marker.title.clone()
        };
        chapters.push(ChapterRecord { title, content });
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_headings_partition_the_file() {
        let text = "## First\nalpha text\n\n## Second\nbeta text\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "First");
        assert_eq!(chapters[0].content, "alpha text");
        assert_eq!(chapters[1].title, "Second");
        assert_eq!(chapters[1].content, "beta text");
    }

    #[test]
    fn test_level_one_and_two_headings_only() {
        let text = "# Top\nintro\n\n### Deep heading\nstill part of Top\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Top");
        assert!(chapters[0].content.contains("### Deep heading"));
    }

    #[test]
    fn test_heading_mid_line_is_not_a_boundary() {
        let text = "Some text # not a heading\nmore text\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Complete Document");
    }

    #[test]
    fn test_textual_markers_engage_without_headings() {
        let text = "Chapter 1\nfirst body\n\nCHAPTER 2\nsecond body\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[0].content, "first body");
        assert_eq!(chapters[1].title, "CHAPTER 2");
    }

    #[test]
    fn test_part_and_book_markers() {
        let text = "Part 1\nalpha\n\nBook 2\nbeta\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Part 1");
        assert_eq!(chapters[1].title, "Book 2");
    }

    #[test]
    fn test_headings_shadow_markers() {
        // Tier 2 only engages when tier 1 finds nothing
        let text = "# Real Heading\nChapter 1\nbody\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Real Heading");
    }

    #[test]
    fn test_no_structure_yields_complete_document() {
        let text = "Just prose with no structure at all.\nSecond line.";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Complete Document");
        assert_eq!(chapters[0].content, text);
    }

    #[test]
    fn test_empty_windows_are_skipped() {
        let text = "## Empty\n## Full\ncontent here\n";
        let chapters = chapters_from_text(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Full");
    }

    #[test]
    fn test_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.md");
        std::fs::write(&path, "# One\nbody\n").unwrap();
        let chapters = extract_chapters_markdown(&path).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "One");
    }
}
