//! Audio segment concatenation using FFmpeg.
//!
//! Concatenation preserves segment order; chunk order within a chapter
//! maps directly onto playback order.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Concatenate ordered audio segments into one file.
///
/// Uses FFmpeg's concat demuxer for lossless concatenation of
/// same-format files.
pub fn concatenate_audio_files(segments: &[&Path], output_path: &Path) -> Result<()> {
    if segments.is_empty() {
        anyhow::bail!("No audio segments provided");
    }

    if segments.len() == 1 {
        std::fs::copy(segments[0], output_path)?;
        return Ok(());
    }

    let temp_dir = TempDir::new()?;
    let list_file = temp_dir.path().join("concat_list.txt");

    let mut list_content = String::new();
    for path in segments {
        // Escape single quotes in paths for the concat list format
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    std::fs::write(&list_file, &list_content)?;

    let output = Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_file)
        .args(["-c", "copy"])
        .arg(output_path)
        .output()
        .context("Failed to run ffmpeg concat")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg concat failed: {}", stderr);
    }

    Ok(())
}

/// Check whether FFmpeg is on the PATH.
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
