//! URL list loading.
//!
//! The batch input is a plain text file with one URL per line. Empty lines
//! and lines starting with `#` are ignored; order is preserved and defines
//! processing order.

use crate::error::{Result, SkrivError};
use std::path::Path;
use tracing::info;

/// Read URLs from a text file, filtering out comments and empty lines.
///
/// A missing file or a file with no usable URLs is an error; both are
/// fatal at startup, before any job is attempted.
pub fn read_urls_from_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(SkrivError::InvalidInput(format!(
            "{} not found. Create a URLs file with one video URL per line.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(SkrivError::InvalidInput(format!(
            "No URLs found in {}",
            path.display()
        )));
    }

    info!("Found {} URLs in {}", urls.len(), path.display());
    Ok(urls)
}
