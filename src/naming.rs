//! Filename derivation and artifact paths.
//!
//! Every job's video, audio, and transcript files share a single sanitized
//! base name. Derivation is a pure function of the fetched metadata and the
//! job's index, so re-runs land on the same paths.

use crate::config::Settings;
use crate::metadata::VideoMetadata;
use regex::Regex;
use std::path::PathBuf;

/// Derives filesystem-safe base names from video metadata.
pub struct FilenameDeriver {
    reserved_chars: Regex,
    whitespace: Regex,
    underscores: Regex,
    max_length: usize,
}

impl FilenameDeriver {
    pub fn new(max_length: usize) -> Self {
        Self {
            reserved_chars: Regex::new(r#"[<>:"/\\|?*]"#).expect("Invalid regex"),
            whitespace: Regex::new(r"\s+").expect("Invalid regex"),
            underscores: Regex::new(r"_+").expect("Invalid regex"),
            max_length,
        }
    }

    /// Remove characters illegal in file names and bound the length.
    ///
    /// Whitespace runs become a single underscore, underscore runs collapse
    /// to one, and leading/trailing underscores are trimmed after
    /// truncation. A string of pure symbols sanitizes to empty; callers
    /// fall back to the index-based name in that case.
    pub fn sanitize(&self, name: &str) -> String {
        let stripped = self.reserved_chars.replace_all(name, "");
        let underscored = self.whitespace.replace_all(&stripped, "_");
        let collapsed = self.underscores.replace_all(&underscored, "_");

        let truncated: String = collapsed.chars().take(self.max_length).collect();
        truncated.trim_matches('_').to_string()
    }

    /// Derive the base name for a job from its metadata and batch index.
    ///
    /// With metadata present the name is `creator_title_id`; each part has
    /// a fallback when absent. Without metadata the name is `video_<index>`.
    /// View and like counts never contribute, so the name is stable across
    /// re-runs even as those fields drift.
    pub fn derive(&self, metadata: Option<&VideoMetadata>, index: usize) -> String {
        let Some(info) = metadata else {
            return fallback_name(index);
        };

        let creator = info.uploader.as_deref().unwrap_or("unknown");
        let title = info
            .title
            .clone()
            .unwrap_or_else(|| fallback_name(index));
        let id = info
            .id
            .clone()
            .unwrap_or_else(|| index.to_string());

        self.sanitize(&format!("{}_{}_{}", creator, title, id))
    }
}

/// The index-based name used when metadata is absent or sanitization
/// yields nothing usable.
pub fn fallback_name(index: usize) -> String {
    format!("video_{}", index)
}

/// The three derived file paths for one job.
///
/// All paths share the same base name and differ only by directory and
/// extension, so a job's artifacts are disjoint from every other job's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub transcript: PathBuf,
}

impl ArtifactPaths {
    pub fn new(settings: &Settings, base_name: &str) -> Self {
        Self {
            video: settings.video_dir().join(format!("{}.mp4", base_name)),
            audio: settings.audio_dir().join(format!("{}.wav", base_name)),
            transcript: settings
                .transcript_dir()
                .join(format!("{}.txt", base_name)),
        }
    }
}
