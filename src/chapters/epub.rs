//! EPUB chapter extraction: a three-tier fallback chain.
//!
//! Tier 1 follows the table of contents (legacy NCX preferred, EPUB3 nav
//! document otherwise). Tier 2 walks the spine in reading order. Tier 3
//! emits the whole book as a single chapter. Each tier engages only when
//! the previous one produced nothing usable.

use anyhow::Result;
use epub::doc::{EpubDoc, NavPoint};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::ChapterRecord;
use crate::config::AppConfig;

type Package = EpubDoc<BufReader<File>>;

/// Spine titles taken from an in-document heading must be reasonably
/// short to count as a chapter title.
const MAX_HEADING_TITLE_LEN: usize = 120;

/// A table-of-contents entry flattened to what boundary discovery needs.
#[derive(Debug, Clone)]
struct TocEntry {
    title: String,
    href: PathBuf,
}

/// Extract chapters from an EPUB file.
///
/// Package-level open/parse errors are fatal. Failures on individual
/// content items inside the package are logged and the item skipped.
pub fn extract_chapters_epub(path: &Path, config: &AppConfig) -> Result<Vec<ChapterRecord>> {
    let mut doc =
        EpubDoc::new(path).map_err(|e| anyhow::anyhow!("Failed to open EPUB: {}", e))?;

    if let Some(chapters) = toc_chapters(&mut doc, config) {
        debug!("EPUB chapters resolved from table of contents");
        return Ok(chapters);
    }
    if let Some(chapters) = spine_chapters(&mut doc) {
        debug!("EPUB chapters resolved from spine reading order");
        return Ok(chapters);
    }
    debug!("EPUB fallback: extracting whole book as one chapter");
    Ok(whole_book_chapter(&mut doc).into_iter().collect())
}

/// Tier 1: chapters driven by the navigation source.
fn toc_chapters(doc: &mut Package, config: &AppConfig) -> Option<Vec<ChapterRecord>> {
    let entries = if !doc.toc.is_empty() {
        flatten_nav_points(&doc.toc)
    } else {
        nav_document_entries(doc)
    };
    if entries.is_empty() {
        return None;
    }

    let mut chapters = Vec::new();
    let mut seen = HashSet::new();

    for entry in &entries {
        if is_front_matter(&entry.title, &config.front_matter_keywords) {
            debug!("Skipping front matter entry: {}", entry.title);
            continue;
        }

        let href = strip_fragment(&entry.href);
        // Process each unique content document once, even when several
        // TOC entries point into it via fragments.
        if !seen.insert(href.clone()) {
            continue;
        }

        let Some(resource_id) = resolve_content_item(doc, &href) else {
            warn!("TOC entry does not resolve to a content document: {}", href.display());
            continue;
        };
        let Some((bytes, _mime)) = doc.get_resource(&resource_id) else {
            warn!("Failed to read content document: {}", href.display());
            continue;
        };

        let text = html_to_text(&String::from_utf8_lossy(&bytes));
        if text.trim().len() < config.min_chapter_length {
            debug!("Skipping short entry ({} chars): {}", text.trim().len(), entry.title);
            continue;
        }

        let title = if entry.title.trim().is_empty() {
            format!("Chapter {}", chapters.len() + 1)
        } else {
            entry.title.trim().to_string()
        };
        chapters.push(ChapterRecord { title, content: text });
    }

    if chapters.is_empty() { None } else { Some(chapters) }
}

/// Tier 2: one chapter per spine content document, in reading order.
fn spine_chapters(doc: &mut Package) -> Option<Vec<ChapterRecord>> {
    let spine = doc.spine.clone();
    let mut chapters = Vec::new();

    for spine_item in spine.iter() {
        let Some((item_path, mime)) = doc
            .resources
            .get(&spine_item.idref)
            .map(|item| (item.path.clone(), item.mime.clone()))
        else {
            continue;
        };
        if !is_content_mime(&mime) {
            continue;
        }
        let Some((bytes, _mime)) = doc.get_resource(&spine_item.idref) else {
            warn!("Failed to read spine item: {}", spine_item.idref);
            continue;
        };

        let html = String::from_utf8_lossy(&bytes).to_string();
        let text = html_to_text(&html);
        if text.trim().is_empty() {
            continue;
        }

        let title = extract_title_from_html(&html)
            .or_else(|| title_from_file_name(&item_path))
            .unwrap_or_else(|| format!("Chapter {}", chapters.len() + 1));
        chapters.push(ChapterRecord { title, content: text });
    }

    if chapters.is_empty() { None } else { Some(chapters) }
}

/// Tier 3: every content document concatenated into one chapter.
fn whole_book_chapter(doc: &mut Package) -> Option<ChapterRecord> {
    let mut items: Vec<(String, PathBuf)> = doc
        .resources
        .iter()
        .filter(|(_, item)| is_content_mime(&item.mime))
        .map(|(id, item)| (id.clone(), item.path.clone()))
        .collect();
    // Resources live in a map; order by path for a deterministic result.
    items.sort_by(|a, b| a.1.cmp(&b.1));

    let mut parts = Vec::new();
    for (id, path) in items {
        let Some((bytes, _mime)) = doc.get_resource(&id) else {
            warn!("Failed to read content document: {}", path.display());
            continue;
        };
        let text = html_to_text(&String::from_utf8_lossy(&bytes));
        if !text.trim().is_empty() {
            parts.push(text);
        }
    }

    let content = parts.join("\n\n");
    if content.trim().is_empty() {
        None
    } else {
        Some(ChapterRecord {
            title: "Complete Book".to_string(),
            content,
        })
    }
}

/// Flatten the NCX navigation map depth-first, keeping document order.
fn flatten_nav_points(points: &[NavPoint]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    for point in points {
        entries.push(TocEntry {
            title: point.label.clone(),
            href: point.content.clone(),
        });
        entries.extend(flatten_nav_points(&point.children));
    }
    entries
}

static NAV_ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#).unwrap());

/// Locate an EPUB3 navigation document and read its anchor list.
///
/// The nav document is an XHTML item carrying a `<nav epub:type="toc">`
/// element; its anchors are taken in document order.
fn nav_document_entries(doc: &mut Package) -> Vec<TocEntry> {
    let mut candidates: Vec<(String, PathBuf)> = doc
        .resources
        .iter()
        .filter(|(_, item)| is_content_mime(&item.mime))
        .map(|(id, item)| (id.clone(), item.path.clone()))
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    for (id, path) in candidates {
        let Some((bytes, _mime)) = doc.get_resource(&id) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        if !content.contains("epub:type=\"toc\"") && !content.contains("epub:type='toc'") {
            continue;
        }

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let entries: Vec<TocEntry> = NAV_ANCHOR_RE
            .captures_iter(&content)
            .map(|cap| TocEntry {
                title: strip_html_tags(&cap[2]).trim().to_string(),
                href: base.join(&cap[1]),
            })
            .collect();
        if !entries.is_empty() {
            return entries;
        }
    }

    Vec::new()
}

/// Case-insensitive substring match against the front-matter keyword list.
fn is_front_matter(title: &str, keywords: &[String]) -> bool {
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Drop an in-document fragment identifier from an href.
fn strip_fragment(href: &Path) -> PathBuf {
    let raw = href.to_string_lossy();
    match raw.split_once('#') {
        Some((head, _)) => PathBuf::from(head),
        None => href.to_path_buf(),
    }
}

fn is_content_mime(mime: &str) -> bool {
    mime.starts_with("application/xhtml") || mime.starts_with("text/html")
}

/// Resolve an href against the package's content documents, returning the
/// matching resource id.
fn resolve_content_item(doc: &Package, href: &Path) -> Option<String> {
    for (id, item) in doc.resources.iter() {
        if !is_content_mime(&item.mime) {
            continue;
        }
        if item.path.as_path() == href || item.path.ends_with(href) {
            return Some(id.clone());
        }
    }

    // Tolerate hrefs carrying stale directory prefixes
    let name = href.file_name()?;
    doc.resources
        .iter()
        .find(|(_, item)| is_content_mime(&item.mime) && item.path.file_name() == Some(name))
        .map(|(id, _)| id.clone())
}

/// Extract a chapter title from HTML content (first h1 or h2).
fn extract_title_from_html(html: &str) -> Option<String> {
    let html_lower = html.to_lowercase();

    for tag in ["h1", "h2"] {
        let open = format!("<{}", tag);
        let close = format!("</{}>", tag);
        if let Some(start) = html_lower.find(&open) {
            if let Some(tag_end) = html_lower[start..].find('>') {
                let content_start = start + tag_end + 1;
                if let Some(end) = html_lower[content_start..].find(&close) {
                    let title = strip_html_tags(&html[content_start..content_start + end]);
                    let title = title.trim();
                    if !title.is_empty() && title.len() <= MAX_HEADING_TITLE_LEN {
                        return Some(title.to_string());
                    }
                }
            }
        }
    }

    None
}

static GENERIC_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:part|split|text|page|item|index|section|chapter)?\d*$").unwrap());

/// Derive a title from a content file name: underscores become spaces,
/// words are title-cased, generic names ("part0001") are rejected.
fn title_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let cleaned = stem.replace('_', " ");
    let cleaned = cleaned.trim();
    if cleaned.len() < 3 || cleaned.len() > 60 {
        return None;
    }
    if GENERIC_NAME_RE.is_match(&cleaned.replace(' ', "")) {
        return None;
    }
    Some(title_case(cleaned))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip HTML tags from a string.
fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result
}

/// Convert HTML to plain text and tidy the result.
fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 1000);
    tidy_extracted_text(&text)
}

/// Join wrapped lines, keep paragraph breaks, decode common entities.
fn tidy_extracted_text(text: &str) -> String {
    let mut result = String::new();
    let mut prev_was_newline = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !prev_was_newline && !result.is_empty() {
                result.push_str("\n\n");
                prev_was_newline = true;
            }
            continue;
        }

        prev_was_newline = false;
        if !result.is_empty() && !result.ends_with('\n') {
            result.push(' ');
        }
        result.push_str(trimmed);
    }

    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fragment() {
        assert_eq!(
            strip_fragment(Path::new("text/ch01.xhtml#section2")),
            PathBuf::from("text/ch01.xhtml")
        );
        assert_eq!(
            strip_fragment(Path::new("text/ch01.xhtml")),
            PathBuf::from("text/ch01.xhtml")
        );
    }

    #[test]
    fn test_front_matter_matching() {
        let keywords: Vec<String> = ["contents", "title page", "copyright"]
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert!(is_front_matter("Copyright Notice", &keywords));
        assert!(is_front_matter("TABLE OF CONTENTS", &keywords));
        assert!(!is_front_matter("Chapter One", &keywords));
    }

    #[test]
    fn test_extract_title_h1() {
        let html = "<html><body><h1>Chapter One</h1><p>Content here</p></body></html>";
        assert_eq!(extract_title_from_html(html), Some("Chapter One".to_string()));
    }

    #[test]
    fn test_extract_title_h2() {
        let html = "<html><body><h2>Section Title</h2><p>Content</p></body></html>";
        assert_eq!(extract_title_from_html(html), Some("Section Title".to_string()));
    }

    #[test]
    fn test_extract_title_rejects_long_headings() {
        let long = "x".repeat(200);
        let html = format!("<h1>{}</h1>", long);
        assert_eq!(extract_title_from_html(&html), None);
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html_tags("<a href=\"x\">Link</a>"), "Link");
    }

    #[test]
    fn test_title_from_file_name() {
        assert_eq!(
            title_from_file_name(Path::new("OEBPS/the_great_escape.xhtml")),
            Some("The Great Escape".to_string())
        );
        assert_eq!(title_from_file_name(Path::new("OEBPS/part0001.xhtml")), None);
        assert_eq!(title_from_file_name(Path::new("OEBPS/ch.xhtml")), None);
    }

    #[test]
    fn test_nav_anchor_regex() {
        let html = r#"<nav epub:type="toc"><ol>
            <li><a href="ch1.xhtml">Chapter <span>One</span></a></li>
            <li><a href="ch2.xhtml#start">Chapter Two</a></li>
        </ol></nav>"#;
        let captures: Vec<(String, String)> = NAV_ANCHOR_RE
            .captures_iter(html)
            .map(|c| (c[1].to_string(), strip_html_tags(&c[2]).trim().to_string()))
            .collect();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0], ("ch1.xhtml".to_string(), "Chapter One".to_string()));
        assert_eq!(captures[1].0, "ch2.xhtml#start");
    }

    #[test]
    fn test_tidy_extracted_text() {
        let text = "Line one\nwrapped\n\n\nNext paragraph &amp; more";
        let tidied = tidy_extracted_text(text);
        assert_eq!(tidied, "Line one wrapped\n\nNext paragraph & more");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let config = AppConfig::default();
        let result = extract_chapters_epub(Path::new("/nonexistent/book.epub"), &config);
        assert!(result.is_err());
    }
}
