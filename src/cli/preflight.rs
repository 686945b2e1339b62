//! Pre-flight checks before starting a batch.
//!
//! Verifies the external tools the pipeline shells out to. Missing tools
//! are reported as warnings rather than startup errors, since individual
//! jobs surface the concrete failure when a stage actually needs the tool.

use crate::tool::check_command_available;
use tracing::warn;

const REQUIRED_TOOLS: &[&str] = &["yt-dlp", "ffmpeg"];

/// Warn about any missing external tools. Returns their names.
pub async fn check_tools() -> Vec<String> {
    let mut missing = Vec::new();
    for tool in REQUIRED_TOOLS {
        if !check_command_available(tool).await {
            warn!(
                "{} not found in PATH; jobs will fail at the stage that needs it",
                tool
            );
            missing.push(tool.to_string());
        }
    }
    missing
}
