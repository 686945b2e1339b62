//! External tool invocation with deadlines.
//!
//! Every pipeline stage shells out to an external tool (yt-dlp, ffmpeg).
//! This module runs a command with a hard deadline and guarantees the
//! child process does not outlive it: the child is spawned with
//! `kill_on_drop`, so dropping the output future on timeout reaps it.

use crate::error::{Result, SkrivError};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run an external tool with a timeout, capturing its output.
///
/// A non-zero exit status is not an error here; callers inspect the
/// returned [`Output`] and classify failures per stage. Errors are
/// reserved for the tool being absent, failing to spawn, or exceeding
/// the deadline.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("Running {} with {}s deadline", program, timeout.as_secs());

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SkrivError::ToolNotFound(program.to_string())
            } else {
                SkrivError::Io(e)
            }
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SkrivError::ToolTimeout {
            tool: program.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

/// Check whether a command is available in PATH.
pub async fn check_command_available(command: &str) -> bool {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match command {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    Command::new(command)
        .arg(version_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
