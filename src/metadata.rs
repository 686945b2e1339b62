//! Video metadata fetching.
//!
//! Metadata is best-effort: it only feeds the derived filename and the
//! transcript header. Any failure here (timeout, non-zero exit, bad JSON)
//! degrades to "no metadata" with a warning; it never fails the job.

use crate::config::Settings;
use crate::tool::run_tool;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Metadata fetched for a video URL. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    pub uploader: Option<String>,
    pub title: Option<String>,
    pub id: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub duration_seconds: Option<u64>,
}

impl VideoMetadata {
    /// Parse the fields we care about out of yt-dlp's JSON dump.
    fn from_json(json: &Value) -> Self {
        Self {
            uploader: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .map(str::to_string),
            title: json["title"].as_str().map(str::to_string),
            id: json["id"].as_str().map(str::to_string),
            view_count: json["view_count"].as_u64(),
            like_count: json["like_count"].as_u64(),
            duration_seconds: json["duration"].as_f64().map(|d| d as u64),
        }
    }
}

/// Best-effort metadata lookup for a URL.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch metadata, or `None` if it cannot be obtained in time.
    async fn fetch(&self, url: &str) -> Option<VideoMetadata>;
}

/// Fetches metadata with `yt-dlp --dump-json` without downloading.
pub struct YtDlpMetadataFetcher {
    timeout: Duration,
}

impl YtDlpMetadataFetcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.pipeline.metadata_timeout),
        }
    }
}

#[async_trait]
impl MetadataFetcher for YtDlpMetadataFetcher {
    async fn fetch(&self, url: &str) -> Option<VideoMetadata> {
        debug!("Fetching metadata for {}", url);

        let output = match run_tool(
            "yt-dlp",
            ["--dump-json", "--no-download", "--no-warnings", url],
            self.timeout,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Could not fetch metadata: {}", e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "yt-dlp returned non-zero exit code fetching metadata: {}",
                output.status
            );
            return None;
        }

        match serde_json::from_slice::<Value>(&output.stdout) {
            Ok(json) => {
                let metadata = VideoMetadata::from_json(&json);
                debug!(
                    "Fetched metadata: {}",
                    metadata.title.as_deref().unwrap_or("Unknown")
                );
                Some(metadata)
            }
            Err(e) => {
                warn!("Failed to parse metadata JSON: {}", e);
                None
            }
        }
    }
}
