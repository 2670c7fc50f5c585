//! Allocate command implementation.

use super::LogOptions;
use std::path::Path;

/// Runs the allocate command.
pub fn run(path: &Path, options: &LogOptions, pages: usize) -> Result<(), Box<dyn std::error::Error>> {
    if pages == 0 {
        return Err("--pages must be at least 1".into());
    }

    let log = options.open(path, false)?;
    for page in 0..pages {
        log.allocate_page(page)?;
    }
    let mapped = log.mapped_pages();
    log.close()?;

    tracing::info!(pages, "pages allocated");
    println!(
        "{} pages ({} bytes) allocated",
        mapped,
        mapped as u64 * options.page_size
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::options;

    #[test]
    fn extends_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocate.ytp");
        run(&path, &options(), 4).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4 * 64 * 1024);
    }

    #[test]
    fn rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocate.ytp");
        assert!(run(&path, &options(), 17).is_err());
        assert!(run(&path, &options(), 0).is_err());
    }
}
