//! Log configuration.

use crate::error::{YamalError, YamalResult};
use crate::layout::{ByteOrder, HEADER_SIZE};
use std::time::Duration;
use yamal_storage::{PageGeometry, WORD_SIZE};

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: u64 = 4096;

/// Configuration for opening a log.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of each independently mapped page.
    pub page_size: u64,

    /// How far ahead of the write frontier pages are preallocated.
    pub prealloc_size: u64,

    /// Maximum number of pages; bounds the total log size.
    pub max_pages: usize,

    /// Open the file read-only. Read-only handles never write.
    pub read_only: bool,

    /// Whether to create the file if it doesn't exist (writable opens only).
    pub create_if_missing: bool,

    /// Whether to run the background preallocation/flush thread.
    pub maintenance: bool,

    /// Period of the background thread.
    pub maintenance_period: Duration,

    /// Byte order of the records' structural fields.
    pub byte_order: ByteOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 8 * 1024 * 1024,    // 8 MiB
            prealloc_size: 3 * 1024 * 1024, // 3 MiB
            max_pages: 1024 * 64 * 8,
            read_only: false,
            create_if_missing: true,
            maintenance: true,
            maintenance_period: Duration::from_millis(10),
            byte_order: ByteOrder::Little,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the preallocation margin.
    #[must_use]
    pub const fn prealloc_size(mut self, size: u64) -> Self {
        self.prealloc_size = size;
        self
    }

    /// Sets the maximum page count.
    #[must_use]
    pub const fn max_pages(mut self, count: usize) -> Self {
        self.max_pages = count;
        self
    }

    /// Sets read-only mode.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets whether to create the file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Enables or disables the background thread.
    #[must_use]
    pub const fn maintenance(mut self, value: bool) -> Self {
        self.maintenance = value;
        self
    }

    /// Sets the background thread period.
    #[must_use]
    pub const fn maintenance_period(mut self, period: Duration) -> Self {
        self.maintenance_period = period;
        self
    }

    /// Sets the structural byte order.
    #[must_use]
    pub const fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Total bytes addressable by the log.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.geometry().capacity()
    }

    /// Page geometry for the storage layer.
    #[must_use]
    pub const fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_size, self.max_pages)
    }

    /// Checks the configuration for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> YamalResult<()> {
        if self.page_size < MIN_PAGE_SIZE || self.page_size % WORD_SIZE != 0 {
            return Err(YamalError::invalid_config(format!(
                "page size {} must be a multiple of {WORD_SIZE} and at least {MIN_PAGE_SIZE}",
                self.page_size
            )));
        }
        if self.max_pages == 0 {
            return Err(YamalError::invalid_config("max_pages must be non-zero"));
        }
        let capacity = self
            .page_size
            .checked_mul(self.max_pages as u64)
            .ok_or_else(|| YamalError::invalid_config("page_size * max_pages overflows"))?;
        if capacity <= HEADER_SIZE {
            return Err(YamalError::invalid_config("capacity cannot hold the header"));
        }
        if self.prealloc_size >= capacity {
            return Err(YamalError::invalid_config(format!(
                "preallocation margin {} must be smaller than capacity {capacity}",
                self.prealloc_size
            )));
        }
        if self.maintenance && self.maintenance_period.is_zero() {
            return Err(YamalError::invalid_config(
                "maintenance period must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.page_size, 8 * 1024 * 1024);
        assert_eq!(config.prealloc_size, 3 * 1024 * 1024);
        assert!(!config.read_only);
        assert!(config.maintenance);
        assert_eq!(config.byte_order, ByteOrder::Little);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .page_size(64 * 1024)
            .max_pages(16)
            .read_only(true)
            .maintenance(false);

        assert_eq!(config.page_size, 64 * 1024);
        assert_eq!(config.capacity(), 16 * 64 * 1024);
        assert!(config.read_only);
        assert!(!config.maintenance);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(Config::new().page_size(1000).validate().is_err());
        assert!(Config::new().page_size(4100).validate().is_err());
        assert!(Config::new().max_pages(0).validate().is_err());
        assert!(Config::new()
            .page_size(4096)
            .max_pages(1)
            .prealloc_size(4096)
            .validate()
            .is_err());
        assert!(Config::new()
            .maintenance_period(Duration::ZERO)
            .validate()
            .is_err());
    }
}
