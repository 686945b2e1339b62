//! Configuration settings for Skriv.

use crate::error::{Result, SkrivError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub pipeline: PipelineSettings,
    pub whisper: WhisperSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Pipeline settings: input file, output directories, and stage timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Path to the file containing video URLs, one per line.
    pub urls_file: String,
    /// Directory for downloaded videos.
    pub video_dir: String,
    /// Directory for extracted audio.
    pub audio_dir: String,
    /// Directory for transcript artifacts.
    pub transcript_dir: String,
    /// Timeout for video downloads in seconds.
    pub download_timeout: u64,
    /// Timeout for audio extraction in seconds.
    pub audio_timeout: u64,
    /// Timeout for metadata fetching in seconds.
    pub metadata_timeout: u64,
    /// Maximum length of derived base names.
    pub max_filename_length: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            urls_file: "urls.txt".to_string(),
            video_dir: "videos".to_string(),
            audio_dir: "audio".to_string(),
            transcript_dir: "transcripts".to_string(),
            download_timeout: 120,
            audio_timeout: 60,
            metadata_timeout: 60,
            max_filename_length: 50,
        }
    }
}

/// Whisper model size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    /// Name of the ggml model file for this size.
    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self)
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" => Ok(WhisperModel::Large),
            _ => Err(format!("Unknown Whisper model size: {}", s)),
        }
    }
}

impl std::fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WhisperModel::Tiny => write!(f, "tiny"),
            WhisperModel::Base => write!(f, "base"),
            WhisperModel::Small => write!(f, "small"),
            WhisperModel::Medium => write!(f, "medium"),
            WhisperModel::Large => write!(f, "large"),
        }
    }
}

/// Whisper transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperSettings {
    /// Model size to load.
    pub model: WhisperModel,
    /// Directory containing ggml model files.
    pub model_dir: String,
    /// Language code, or "auto" for detection.
    pub language: String,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model: WhisperModel::default(),
            model_dir: "models".to_string(),
            language: "auto".to_string(),
        }
    }
}

impl WhisperSettings {
    /// Full path to the configured model file.
    pub fn model_path(&self) -> PathBuf {
        Settings::expand_path(&self.model_dir).join(self.model.file_name())
    }
}

impl Settings {
    /// Load settings from a specific path, or the default location if None.
    ///
    /// A missing file yields the built-in defaults. Environment overrides
    /// are applied on top in both cases.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Apply the enumerated environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("URLS_FILE") {
            self.pipeline.urls_file = v;
        }
        if let Ok(v) = std::env::var("WHISPER_MODEL") {
            self.whisper.model = v
                .parse()
                .map_err(SkrivError::Config)?;
        }
        if let Ok(v) = std::env::var("VIDEO_DIR") {
            self.pipeline.video_dir = v;
        }
        if let Ok(v) = std::env::var("AUDIO_DIR") {
            self.pipeline.audio_dir = v;
        }
        if let Ok(v) = std::env::var("TRANSCRIPT_DIR") {
            self.pipeline.transcript_dir = v;
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skriv")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded URLs file path.
    pub fn urls_file(&self) -> PathBuf {
        Self::expand_path(&self.pipeline.urls_file)
    }

    /// Get the expanded video directory path.
    pub fn video_dir(&self) -> PathBuf {
        Self::expand_path(&self.pipeline.video_dir)
    }

    /// Get the expanded audio directory path.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.pipeline.audio_dir)
    }

    /// Get the expanded transcript directory path.
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.pipeline.transcript_dir)
    }

    /// Create the three output directories before the batch starts.
    pub fn create_directories(&self) -> Result<()> {
        for dir in [self.video_dir(), self.audio_dir(), self.transcript_dir()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pipeline.urls_file, "urls.txt");
        assert_eq!(settings.pipeline.video_dir, "videos");
        assert_eq!(settings.pipeline.audio_dir, "audio");
        assert_eq!(settings.pipeline.transcript_dir, "transcripts");
        assert_eq!(settings.pipeline.download_timeout, 120);
        assert_eq!(settings.pipeline.audio_timeout, 60);
        assert_eq!(settings.pipeline.metadata_timeout, 60);
        assert_eq!(settings.pipeline.max_filename_length, 50);
        assert_eq!(settings.whisper.model, WhisperModel::Base);
    }

    #[test]
    fn test_model_parse_and_display() {
        assert_eq!("tiny".parse::<WhisperModel>(), Ok(WhisperModel::Tiny));
        assert_eq!("LARGE".parse::<WhisperModel>(), Ok(WhisperModel::Large));
        assert!("huge".parse::<WhisperModel>().is_err());
        assert_eq!(WhisperModel::Medium.to_string(), "medium");
        assert_eq!(WhisperModel::Small.file_name(), "ggml-small.bin");
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[pipeline]
urls_file = "batch.txt"
download_timeout = 30

[whisper]
model = "small"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.pipeline.urls_file, "batch.txt");
        assert_eq!(settings.pipeline.download_timeout, 30);
        // Unspecified fields keep their defaults
        assert_eq!(settings.pipeline.audio_timeout, 60);
        assert_eq!(settings.whisper.model, WhisperModel::Small);
    }
}
