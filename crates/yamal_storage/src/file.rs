//! Backing file handle for a paged log.

use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// The file underneath a paged log.
///
/// Wraps a `File` together with its access mode. The file only ever grows:
/// [`LogFile::ensure_len`] extends it with `fallocate`-style preallocation and
/// never truncates, so several handles (or processes) racing to extend the
/// same file converge on the largest requested size.
///
/// # Example
///
/// ```no_run
/// use yamal_storage::LogFile;
/// use std::path::Path;
///
/// let file = LogFile::open(Path::new("data.ytp"), false, true).unwrap();
/// file.ensure_len(8 * 1024 * 1024).unwrap();
/// ```
#[derive(Debug)]
pub struct LogFile {
    path: Option<PathBuf>,
    file: File,
    read_only: bool,
}

impl LogFile {
    /// Opens the file at `path`.
    ///
    /// A writable open creates the file when `create` is set. A read-only open
    /// never creates anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path, read_only: bool, create: bool) -> StorageResult<Self> {
        let file = if read_only {
            OpenOptions::new().read(true).open(path)?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(create)
                .truncate(false)
                .open(path)?
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            file,
            read_only,
        })
    }

    /// Adopts an already open file.
    ///
    /// The caller states the access mode; a file opened without write access
    /// must be adopted with `read_only` set or mapping will fail.
    #[must_use]
    pub fn from_file(file: File, read_only: bool) -> Self {
        Self {
            path: None,
            file,
            read_only,
        }
    }

    /// Returns the path the file was opened from, if known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the underlying file.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Returns whether the file was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the current file size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn len(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Returns whether the file is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Makes sure the file is at least `len` bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only file, or an I/O error
    /// if the space cannot be allocated.
    pub fn ensure_len(&self, len: u64) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        if self.len()? >= len {
            return Ok(());
        }
        self.file.allocate(len)?;
        tracing::debug!(len, "extended log file");
        Ok(())
    }

    /// Flushes file data and metadata to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    pub fn sync_all(&self) -> StorageResult<()> {
        if self.read_only {
            return Ok(());
        }
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ytp");

        let file = LogFile::open(&path, false, true).unwrap();
        assert!(file.is_empty().unwrap());
        assert!(path.exists());
        assert_eq!(file.path(), Some(path.as_path()));
    }

    #[test]
    fn file_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.ytp");

        assert!(LogFile::open(&path, false, false).is_err());
        assert!(LogFile::open(&path, true, true).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn ensure_len_only_grows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ytp");

        let file = LogFile::open(&path, false, true).unwrap();
        file.ensure_len(8192).unwrap();
        assert_eq!(file.len().unwrap(), 8192);

        file.ensure_len(4096).unwrap();
        assert_eq!(file.len().unwrap(), 8192);
    }

    #[test]
    fn ensure_len_read_only_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ytp");
        std::fs::write(&path, b"abc").unwrap();

        let file = LogFile::open(&path, true, false).unwrap();
        assert!(matches!(file.ensure_len(4096), Err(StorageError::ReadOnly)));
        assert_eq!(file.len().unwrap(), 3);
    }

    #[test]
    fn from_file_has_no_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ytp");
        let raw = File::create(&path).unwrap();

        let file = LogFile::from_file(raw, false);
        assert!(file.path().is_none());
        assert!(!file.is_read_only());
    }
}
