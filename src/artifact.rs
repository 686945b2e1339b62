//! Transcript artifact writing.
//!
//! The transcript file doubles as the progress marker for re-runs, so the
//! write goes through a temporary file in the same directory followed by
//! an atomic rename. A crash mid-write never leaves a truncated file that
//! would satisfy the "already exists" skip check.

use crate::error::{Result, SkrivError};
use crate::metadata::VideoMetadata;
use chrono::Local;
use std::io::Write;
use std::path::Path;
use tracing::info;

const SEPARATOR_WIDTH: usize = 50;

/// Write the transcript with its metadata header.
///
/// The metadata block is omitted entirely when no metadata was fetched;
/// individual missing fields within it render as "Unknown".
pub fn write_transcript(
    path: &Path,
    url: &str,
    metadata: Option<&VideoMetadata>,
    transcript: &str,
) -> Result<()> {
    let content = render(url, metadata, transcript, &Local::now().format("%+").to_string());

    let dir = path.parent().ok_or_else(|| {
        SkrivError::InvalidInput(format!("Transcript path has no parent: {}", path.display()))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| SkrivError::Io(e.error))?;

    info!("Transcript saved to {}", path.display());
    Ok(())
}

fn render(
    url: &str,
    metadata: Option<&VideoMetadata>,
    transcript: &str,
    timestamp: &str,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("URL: {}\n", url));

    if let Some(info) = metadata {
        out.push_str(&format!(
            "Creator: {}\n",
            info.uploader.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!(
            "Title: {}\n",
            info.title.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!("Views: {}\n", display_count(info.view_count)));
        out.push_str(&format!("Likes: {}\n", display_count(info.like_count)));
        out.push_str(&format!(
            "Duration: {}s\n",
            display_count(info.duration_seconds)
        ));
    }

    out.push_str(&format!("Transcribed: {}\n", timestamp));
    out.push_str(&format!("\n{}\n\n", "=".repeat(SEPARATOR_WIDTH)));
    out.push_str(transcript);
    out
}

fn display_count(value: Option<u64>) -> String {
    value.map_or_else(|| "Unknown".to_string(), |v| v.to_string())
}
