//! audiobook-gen configuration and heuristic constants.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default TTS voice.
const DEFAULT_VOICE: &str = "nova";

/// Soft chunk size limit (characters) for a single synthesis request.
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Minimum extracted text length for a TOC-driven EPUB chapter.
/// Anything shorter is treated as a blank or divider page.
const DEFAULT_MIN_CHAPTER_LENGTH: usize = 100;

/// TOC titles containing any of these (case-insensitive) are front
/// matter, not chapters.
const FRONT_MATTER_KEYWORDS: &[&str] = &[
    "contents",
    "title page",
    "copyright",
    "introduction",
    "preface",
    "dedication",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// TTS voice name
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Soft chunk size limit in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Minimum content length for TOC-driven EPUB chapters
    #[serde(default = "default_min_chapter_length")]
    pub min_chapter_length: usize,

    /// Lowercase keywords marking EPUB TOC entries as front matter
    #[serde(default = "default_front_matter_keywords")]
    pub front_matter_keywords: Vec<String>,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_min_chapter_length() -> usize {
    DEFAULT_MIN_CHAPTER_LENGTH
}

fn default_front_matter_keywords() -> Vec<String> {
    FRONT_MATTER_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            chunk_size: default_chunk_size(),
            min_chapter_length: default_min_chapter_length(),
            front_matter_keywords: default_front_matter_keywords(),
        }
    }
}

impl AppConfig {
    /// Get the config file path: ~/.config/cli-programs/audiobook-gen.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("audiobook-gen.toml"))
    }

    /// Load config from file, returning default if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

/// Read the OpenAI API key from the environment.
pub fn api_key() -> Result<String> {
    let key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    let key = key.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("OPENAI_API_KEY not found in the environment");
    }
    Ok(key)
}

/// Mask an API key for logging: first four and last four characters only.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "[EMPTY OR INVALID KEY]".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.voice, "nova");
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.min_chapter_length, 100);
        assert!(config.front_matter_keywords.contains(&"copyright".to_string()));
    }

    #[test]
    fn test_config_path() {
        let path = AppConfig::config_path().unwrap();
        assert!(path.ends_with("cli-programs/audiobook-gen.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
voice = "onyx"
chunk_size = 2000
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice, "onyx");
        assert_eq!(config.chunk_size, 2000);
        // Unspecified fields fall back to defaults
        assert_eq!(config.min_chapter_length, 100);
        assert_eq!(config.front_matter_keywords.len(), 6);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.voice, "nova");
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn test_mask_api_key() {
        // 15 chars: 4 shown + 7 masked + 4 shown
        assert_eq!(mask_api_key("sk-abcdefghijkl"), "sk-a*******ijkl");
        // Exactly 8 chars leaves nothing to mask
        assert_eq!(mask_api_key("sk-12345"), "sk-12345");
        assert_eq!(mask_api_key("short"), "[EMPTY OR INVALID KEY]");
        assert_eq!(mask_api_key(""), "[EMPTY OR INVALID KEY]");
    }

    #[test]
    fn test_mask_api_key_multibyte() {
        // Masking counts characters, not bytes
        assert_eq!(mask_api_key("sécrétkey"), "sécr*tkey");
    }
}
