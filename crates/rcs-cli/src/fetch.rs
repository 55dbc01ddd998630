//! Retrieval of task files from local paths or remote URLs.

use std::path::Path;

use anyhow::{Context, Result};

/// True when `source` names an HTTP(S) resource rather than a file.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read a task file, resolving relative paths against `base_dir`.
pub fn read_task_source(source: &str, base_dir: &Path) -> Result<String> {
    if is_remote(source) {
        return fetch_text(source);
    }
    let path = base_dir.join(source);
    std::fs::read_to_string(&path)
        .with_context(|| format!("Cannot read task file {}", path.display()))
}

/// Download a text resource with a blocking GET.
#[cfg(feature = "fetch")]
pub fn fetch_text(url: &str) -> Result<String> {
    log::info!("Downloading task file from {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to {} failed", url))?;
    if !response.status().is_success() {
        anyhow::bail!("Failed to download {}: HTTP {}", url, response.status());
    }

    let body = response
        .text()
        .with_context(|| format!("Failed to read response body from {}", url))?;

    // An HTML page here is a server error page, not a task file.
    let head = body.trim_start();
    if head.starts_with("<!DOC") || head.starts_with("<html") || head.starts_with("<HTML") {
        anyhow::bail!("Received an HTML page instead of a task file from {}", url);
    }
    Ok(body)
}

#[cfg(not(feature = "fetch"))]
pub fn fetch_text(url: &str) -> Result<String> {
    anyhow::bail!(
        "Task source '{}' is remote, but rcs-cli was built without --features fetch",
        url
    )
}
