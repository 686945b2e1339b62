//! Audio extraction.
//!
//! Extracts the audio track from a downloaded video as 16 kHz mono WAV,
//! the input format the Whisper engine consumes directly.

use crate::config::Settings;
use crate::error::{Result, SkrivError};
use crate::tool::run_tool;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Extracts the audio track from a video file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, video: &Path, audio: &Path) -> Result<()>;
}

/// Extracts audio with ffmpeg.
pub struct FfmpegAudioExtractor {
    timeout: Duration,
}

impl FfmpegAudioExtractor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.pipeline.audio_timeout),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract(&self, video: &Path, audio: &Path) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video.display(),
            audio.display()
        );

        let video_arg = video.to_string_lossy();
        let audio_arg = audio.to_string_lossy();
        let result = run_tool(
            "ffmpeg",
            [
                "-i",
                video_arg.as_ref(),
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                "16000",
                "-ac",
                "1",
                "-y",
                "-loglevel",
                "error",
                audio_arg.as_ref(),
            ],
            self.timeout,
        )
        .await
        .map_err(|e| match e {
            SkrivError::ToolNotFound(_) | SkrivError::ToolTimeout { .. } => {
                SkrivError::AudioExtraction(e.to_string())
            }
            other => other,
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let cause = if stderr.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(SkrivError::AudioExtraction(cause));
        }

        if !audio.exists() {
            return Err(SkrivError::AudioExtraction(format!(
                "Extracted audio file not found at {}",
                audio.display()
            )));
        }

        info!("Audio extracted successfully");
        Ok(())
    }
}
