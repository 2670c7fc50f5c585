//! Announce command implementation.

use super::LogOptions;
use std::path::Path;
use yamal_core::framing::producer;

/// Runs the announce command.
pub fn run(path: &Path, options: &LogOptions, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let log = options.open(path, false)?;
    let position = producer::announce(&log, name.as_bytes())?;
    let offset = log.tell(position);
    log.close()?;

    tracing::info!(name, offset, "announcement written");
    println!("@{offset} announced {name}");
    Ok(())
}
