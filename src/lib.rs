//! Skriv - Batch Video Transcription
//!
//! A local-first CLI tool for downloading videos and generating transcripts
//! with a locally loaded Whisper model.
//!
//! The name "Skriv" comes from the Norwegian/Scandinavian word for "write."
//!
//! # Overview
//!
//! Skriv reads a list of video URLs from a text file and runs each one
//! through a fixed pipeline:
//!
//! 1. Fetch metadata (best-effort, via yt-dlp)
//! 2. Download the video (yt-dlp)
//! 3. Extract audio (ffmpeg, 16 kHz mono WAV)
//! 4. Transcribe the audio (Whisper)
//! 5. Write a transcript artifact with a metadata header
//!
//! A job whose transcript already exists is skipped, so re-running the same
//! batch only reprocesses what is missing. A failing URL never aborts the
//! batch; failures are classified by stage and rolled up into a summary.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `urls` - URL list loading
//! - `naming` - Filename derivation and artifact paths
//! - `tool` - External tool invocation with deadlines
//! - `metadata` - Video metadata fetching
//! - `download` - Video downloading
//! - `audio` - Audio extraction
//! - `transcription` - Speech-to-text transcription
//! - `artifact` - Transcript artifact writing
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skriv::config::Settings;
//! use skriv::orchestrator::Orchestrator;
//! use skriv::transcription::WhisperEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load_from(None)?;
//!     settings.create_directories()?;
//!
//!     let engine = Arc::new(WhisperEngine::load(
//!         &settings.whisper.model_path(),
//!         &settings.whisper.language,
//!     )?);
//!
//!     let orchestrator = Orchestrator::new(settings, engine);
//!     let summary = orchestrator.run(&["https://example.com/v/1".into()]).await;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod audio;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod orchestrator;
pub mod tool;
pub mod transcription;
pub mod urls;

pub use error::{Result, SkrivError};
