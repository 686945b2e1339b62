//! Speech-to-text transcription.
//!
//! The [`Transcriber`] trait is the seam between the pipeline and the
//! speech model; the default implementation is a locally loaded Whisper
//! model (see [`whisper`]).

mod whisper;

pub use whisper::WhisperEngine;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Transcribes an audio file to text.
///
/// The engine is loaded once at startup and shared read-only across all
/// jobs in a batch.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio at `audio_path`. Empty output is an error.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;

    /// Name of the loaded model, for logging.
    fn model_name(&self) -> &str;
}
