//! audiobook-gen - Convert text documents (DOCX, EPUB, Markdown) into
//! chaptered audiobooks.

use anyhow::{Context, Result};
use audiobook_gen::chapters::{self, ChapterRecord};
use audiobook_gen::config::{self, AppConfig};
use audiobook_gen::tts::openai::OpenAiSpeech;
use audiobook_gen::{audio, text};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Voices accepted by the OpenAI speech endpoint.
const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

#[derive(Parser, Debug)]
#[command(name = "audiobook-gen")]
#[command(about = "Convert text documents (DOCX, EPUB, Markdown) into audiobooks", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the input document (.docx, .epub, .md, .markdown)
    input_file: PathBuf,

    /// Directory for generated audio files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// TTS voice
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(OPENAI_VOICES))]
    voice: Option<String>,

    /// Soft chunk size limit in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Detect chapters and list them without generating audio
    #[arg(long)]
    dry_run: bool,

    /// Write each synthesis chunk to a text file instead of calling the API
    #[arg(long)]
    debug_synthesis: bool,

    /// Enable detailed debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Show only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if !args.input_file.exists() {
        anyhow::bail!("Input file not found: {}", args.input_file.display());
    }

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(ref voice) = args.voice {
        config.voice = voice.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }

    let chapters = chapters::extract_chapters(&args.input_file, &config).with_context(|| {
        format!("Failed to extract chapters from {}", args.input_file.display())
    })?;

    if chapters.is_empty() {
        warn!("No chapters detected or text extracted; nothing to synthesize");
        return Ok(());
    }
    info!("Detected {} chapter(s)", chapters.len());

    if args.dry_run {
        print_chapter_listing(&chapters);
        return Ok(());
    }

    if args.debug_synthesis {
        return dump_synthesis_input(&args.output_dir, &config, &chapters);
    }

    let api_key = config::api_key()?;
    let synthesizer = OpenAiSpeech::new(api_key, config.voice.clone());
    info!("Using voice: {}", config.voice);

    generate_audiobook(&args, &config, &chapters, &synthesizer).await
}

fn print_chapter_listing(chapters: &[ChapterRecord]) {
    println!("Detected {} chapter(s):", chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        let preview: String = chapter
            .content
            .chars()
            .take(100)
            .collect::<String>()
            .replace('\n', " ");
        println!(
            "{:3}. {} ({} words) {}...",
            i + 1,
            chapter.title,
            chapter.word_count(),
            preview
        );
    }
}

/// Write every TTS chunk to `<output>/debug/` as text, exactly as it
/// would be sent to the synthesizer.
fn dump_synthesis_input(
    output_dir: &Path,
    config: &AppConfig,
    chapters: &[ChapterRecord],
) -> Result<()> {
    let debug_dir = output_dir.join("debug");
    std::fs::create_dir_all(&debug_dir)
        .with_context(|| format!("Failed to create {}", debug_dir.display()))?;

    let mut written = 0usize;
    for (chapter_id, chapter) in chapters.iter().enumerate() {
        let spoken = format!("{}. {}", chapter.title, chapter.content);
        for chunk in text::process_chapter(chapter_id, &spoken, config.chunk_size) {
            let path = debug_dir.join(format!(
                "ch{:04}_ck{:04}.txt",
                chunk.chapter_id, chunk.chunk_id
            ));
            std::fs::write(&path, &chunk.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += 1;
        }
    }

    info!("Wrote {} chunk file(s) to {}", written, debug_dir.display());
    Ok(())
}

/// Synthesize every chapter to its own MP3, then combine them into one
/// audiobook file.
async fn generate_audiobook(
    args: &Args,
    config: &AppConfig,
    chapters: &[ChapterRecord],
    synthesizer: &OpenAiSpeech,
) -> Result<()> {
    let chapters_dir = args.output_dir.join("chapters");
    std::fs::create_dir_all(&chapters_dir)
        .with_context(|| format!("Failed to create {}", chapters_dir.display()))?;

    if !audio::is_ffmpeg_available() {
        anyhow::bail!("ffmpeg not found on PATH; it is required for audio concatenation");
    }

    // Chunk all chapters up front so the progress bar covers everything
    let chapter_chunks: Vec<Vec<text::TextChunk>> = chapters
        .iter()
        .enumerate()
        .map(|(i, chapter)| {
            // Speak the title before the chapter body
            let spoken = format!("{}. {}", chapter.title, chapter.content);
            text::process_chapter(i, &spoken, config.chunk_size)
        })
        .collect();

    let total_chunks: usize = chapter_chunks.iter().map(|c| c.len()).sum();
    info!("Synthesizing {} chunk(s)", total_chunks);

    let pb = ProgressBar::new(total_chunks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    let mut chapter_files: Vec<PathBuf> = Vec::new();

    for (chapter_id, chunks) in chapter_chunks.iter().enumerate() {
        if chunks.is_empty() {
            warn!("Chapter {} has no synthesizable text, skipping", chapter_id + 1);
            continue;
        }
        pb.set_message(chapters[chapter_id].title.clone());

        let mut segment_files: Vec<PathBuf> = Vec::new();
        for chunk in chunks {
            let bytes = synthesizer.synthesize(&chunk.text).await.with_context(|| {
                format!(
                    "Failed to synthesize chapter {} chunk {}",
                    chunk.chapter_id + 1,
                    chunk.chunk_id
                )
            })?;
            let segment_path = scratch
                .path()
                .join(format!("ch{:04}_ck{:04}.mp3", chunk.chapter_id, chunk.chunk_id));
            std::fs::write(&segment_path, &bytes)
                .with_context(|| format!("Failed to write {}", segment_path.display()))?;
            segment_files.push(segment_path);
            pb.inc(1);
        }

        let chapter_path = chapters_dir.join(format!(
            "{:03} - {}.mp3",
            chapter_id + 1,
            sanitize_filename(&chapters[chapter_id].title)
        ));
        let segment_refs: Vec<&Path> = segment_files.iter().map(|p| p.as_path()).collect();
        audio::concatenate_audio_files(&segment_refs, &chapter_path)
            .with_context(|| format!("Failed to assemble chapter {}", chapter_id + 1))?;
        chapter_files.push(chapter_path);
    }

    pb.finish_with_message("Synthesis complete");

    if chapter_files.is_empty() {
        anyhow::bail!("No audio was generated");
    }

    let stem = args
        .input_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audiobook".to_string());
    let combined_path = args.output_dir.join(format!("{}_full.mp3", stem));
    let chapter_refs: Vec<&Path> = chapter_files.iter().map(|p| p.as_path()).collect();
    audio::concatenate_audio_files(&chapter_refs, &combined_path)
        .context("Failed to combine chapter audio")?;

    info!(
        "Generated {} chapter file(s) in {}",
        chapter_files.len(),
        chapters_dir.display()
    );
    info!("Combined audiobook saved as {}", combined_path.display());

    Ok(())
}

/// Make a chapter title safe for use in a file name.
fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim();
    let truncated: String = trimmed.chars().take(60).collect();
    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}
