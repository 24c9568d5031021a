use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::engine::Disposition;

/// Open a URL in the default browser.
///
/// Uses `setsid -f xdg-open` so the browser is detached from this
/// process and survives it exiting. The disposition is recorded for
/// diagnostics; a command-line opener cannot steer browser tab
/// placement.
pub fn open_url(url: &str, disposition: Disposition) -> Result<()> {
    debug!("Opening {} ({:?})", url, disposition);

    let full_command = format!("setsid -f xdg-open '{}'", url.replace('\'', "%27"));

    Command::new("sh")
        .arg("-c")
        .arg(&full_command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to open URL in browser")?;

    info!("Opened {}", url);
    Ok(())
}
