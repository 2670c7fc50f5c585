//! Error types for yamal core.

use std::io;
use thiserror::Error;
use yamal_storage::StorageError;

/// Result type for core operations.
pub type YamalResult<T> = Result<T, YamalError>;

/// Errors that can occur in yamal log operations.
#[derive(Debug, Error)]
pub enum YamalError {
    /// Page storage error (mapping, file extension, end of file).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reservation size is zero or larger than a page can hold.
    #[error("invalid size {size}: {reason}")]
    InvalidSize {
        /// The requested payload size.
        size: usize,
        /// Why the size was rejected.
        reason: &'static str,
    },

    /// A write path was invoked through a read-only handle.
    #[error("unable to {operation} using a read-only log")]
    ReadOnly {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The offset does not name a record, or the iterator has no current record.
    #[error("invalid offset {offset}")]
    InvalidOffset {
        /// The offending offset.
        offset: u64,
    },

    /// The file is not a yamal log, or was written with another layout.
    #[error("invalid yamal file format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A compare-and-swap observed a concurrent change that cannot be retried.
    #[error("lost race: {message}")]
    LostRace {
        /// What was changed concurrently.
        message: String,
    },

    /// The write frontier would pass the configured capacity.
    #[error("log is full: {requested} bytes requested at frontier {frontier}, capacity {capacity}")]
    Full {
        /// Node size requested.
        requested: u64,
        /// Write frontier at the time of the request.
        frontier: u64,
        /// Configured capacity in bytes.
        capacity: u64,
    },

    /// Producer id 0 was used for a record that carries topic framing.
    #[error("producer id 0 is reserved for announcements")]
    ReservedProducer,

    /// The configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The maintenance thread panicked before shutdown.
    #[error("maintenance thread panicked")]
    MaintenancePanicked,
}

/// Coarse classification of [`YamalError`], flattening storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Zero-length or oversized reservation.
    InvalidSize,
    /// Write attempted through a read-only handle.
    ReadOnly,
    /// Operation on a null or out-of-range offset.
    InvalidOffset,
    /// Page mapping failed for lack of memory.
    OutOfMemory,
    /// Read-only page request past the end of the file.
    EndOfFile,
    /// Signature or layout mismatch on open.
    InvalidFormat,
    /// Underlying I/O failure.
    Io,
    /// A compare-and-swap observed a concurrent change.
    LostRace,
    /// Capacity exhausted.
    Full,
    /// Announcement producer id used with topic framing.
    ReservedProducer,
    /// Inconsistent configuration.
    InvalidConfig,
}

impl YamalError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => match e {
                StorageError::Io(_) | StorageError::Map { .. } => ErrorKind::Io,
                StorageError::EndOfFile { .. } => ErrorKind::EndOfFile,
                StorageError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
                StorageError::ReadOnly => ErrorKind::ReadOnly,
                StorageError::PageOutOfRange { .. } | StorageError::InvalidRange { .. } => {
                    ErrorKind::InvalidOffset
                }
            },
            Self::Io(_) | Self::MaintenancePanicked => ErrorKind::Io,
            Self::InvalidSize { .. } => ErrorKind::InvalidSize,
            Self::ReadOnly { .. } => ErrorKind::ReadOnly,
            Self::InvalidOffset { .. } => ErrorKind::InvalidOffset,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::LostRace { .. } => ErrorKind::LostRace,
            Self::Full { .. } => ErrorKind::Full,
            Self::ReservedProducer => ErrorKind::ReservedProducer,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a lost race error.
    pub fn lost_race(message: impl Into<String>) -> Self {
        Self::LostRace {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a read-only violation error.
    pub fn read_only(operation: &'static str) -> Self {
        Self::ReadOnly { operation }
    }
}
