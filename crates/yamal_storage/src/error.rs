//! Error types for page storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while mapping or extending the backing file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read-only file does not yet cover the requested page.
    #[error("unexpected EOF: page {page} needs {required} bytes, file has {file_size}")]
    EndOfFile {
        /// The requested page index.
        page: usize,
        /// File size required to map the page.
        required: u64,
        /// The current file size.
        file_size: u64,
    },

    /// The page index is beyond the configured page table.
    #[error("page index {page} out of range (max {max_pages} pages)")]
    PageOutOfRange {
        /// The requested page index.
        page: usize,
        /// The configured page count.
        max_pages: usize,
    },

    /// The kernel refused to map the page for lack of memory.
    #[error("out of memory mapping page {page}: {source}")]
    OutOfMemory {
        /// The page that failed to map.
        page: usize,
        /// The underlying OS error.
        source: io::Error,
    },

    /// Mapping the page failed for a reason other than memory pressure.
    #[error("mmap of page {page} failed: {source}")]
    Map {
        /// The page that failed to map.
        page: usize,
        /// The underlying OS error.
        source: io::Error,
    },

    /// A write path was invoked on a read-only file.
    #[error("file is opened read-only")]
    ReadOnly,

    /// The byte range is misaligned or crosses a page boundary.
    #[error("invalid range: offset {offset}, len {len}")]
    InvalidRange {
        /// Start of the requested range.
        offset: u64,
        /// Length of the requested range.
        len: u64,
    },
}

impl StorageError {
    pub(crate) fn from_map(page: usize, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::OutOfMemory {
            Self::OutOfMemory { page, source }
        } else {
            Self::Map { page, source }
        }
    }
}
