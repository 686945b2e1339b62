//! Video downloading.

use crate::config::Settings;
use crate::error::{Result, SkrivError};
use crate::tool::run_tool;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Downloads a video from a URL to a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, output: &Path) -> Result<()>;
}

/// Downloads videos with yt-dlp.
pub struct YtDlpDownloader {
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.pipeline.download_timeout),
        }
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, url: &str, output: &Path) -> Result<()> {
        info!("Downloading video to {}", output.display());

        let output_arg = output.to_string_lossy();
        let result = run_tool(
            "yt-dlp",
            ["-o", output_arg.as_ref(), "-f", "mp4", "--no-playlist", url],
            self.timeout,
        )
        .await
        .map_err(|e| match e {
            SkrivError::ToolNotFound(_) | SkrivError::ToolTimeout { .. } => {
                SkrivError::Download(e.to_string())
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
            return Err(SkrivError::Download(cause));
        }

        // yt-dlp can exit zero without producing the requested file
        if !output.exists() {
            return Err(SkrivError::Download(format!(
                "Downloaded file not found at {}",
                output.display()
            )));
        }

        info!("Video downloaded successfully");
        Ok(())
    }
}
