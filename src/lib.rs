//! audiobook-gen - chapter extraction and sentence-aware text segmentation
//! for turning DOCX, EPUB, and Markdown documents into audiobook audio.

pub mod audio;
pub mod chapters;
pub mod config;
pub mod text;
pub mod tts;
