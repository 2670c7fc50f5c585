//! CLI command implementations.

pub mod allocate;
pub mod announce;
pub mod inspect;
pub mod tail;

use std::path::Path;
use yamal_core::{Config, Yamal, YamalResult};

/// Geometry shared by every command; must match the log's writers.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Page size in bytes.
    pub page_size: u64,
    /// Maximum page count.
    pub max_pages: usize,
}

impl LogOptions {
    /// Opens the log without a maintenance thread.
    pub fn open(&self, path: &Path, read_only: bool) -> YamalResult<Yamal> {
        let config = Config::new()
            .page_size(self.page_size)
            .max_pages(self.max_pages)
            .prealloc_size(0)
            .maintenance(false)
            .read_only(read_only)
            .create_if_missing(!read_only);
        Yamal::open(path, config)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::LogOptions;

    pub(crate) fn options() -> LogOptions {
        LogOptions {
            page_size: 64 * 1024,
            max_pages: 16,
        }
    }
}
