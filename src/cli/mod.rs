//! CLI module for Skriv.

pub mod preflight;

use crate::config::WhisperModel;
use clap::Parser;

/// Skriv - Batch Video Transcription
///
/// A local-first CLI tool for downloading videos and generating transcripts
/// with Whisper. The name "Skriv" comes from the Norwegian/Scandinavian
/// word for "write."
#[derive(Parser, Debug)]
#[command(name = "skriv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to file containing URLs (default: urls.txt)
    #[arg(short, long)]
    pub urls: Option<String>,

    /// Whisper model size
    #[arg(short, long, value_enum)]
    pub model: Option<WhisperModel>,

    /// Directory for downloaded videos (default: videos)
    #[arg(long)]
    pub video_dir: Option<String>,

    /// Directory for extracted audio (default: audio)
    #[arg(long)]
    pub audio_dir: Option<String>,

    /// Directory for transcripts (default: transcripts)
    #[arg(long)]
    pub transcript_dir: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Apply CLI flags on top of loaded settings. Flags win over both the
    /// config file and environment variables.
    pub fn apply_to(&self, settings: &mut crate::config::Settings) {
        if let Some(urls) = &self.urls {
            settings.pipeline.urls_file = urls.clone();
        }
        if let Some(model) = self.model {
            settings.whisper.model = model;
        }
        if let Some(dir) = &self.video_dir {
            settings.pipeline.video_dir = dir.clone();
        }
        if let Some(dir) = &self.audio_dir {
            settings.pipeline.audio_dir = dir.clone();
        }
        if let Some(dir) = &self.transcript_dir {
            settings.pipeline.transcript_dir = dir.clone();
        }
    }
}
