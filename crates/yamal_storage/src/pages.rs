//! Lazily mapped page table over the backing file.

use crate::error::{StorageError, StorageResult};
use crate::file::LogFile;
use memmap2::{Mmap, MmapMut, MmapOptions};
use parking_lot::Mutex;
use std::fmt;
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

/// Size of a machine word; every offset handed out by the log is a multiple.
pub const WORD_SIZE: u64 = 8;

/// Page size and page count of a paged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    /// Size of a single page in bytes.
    pub page_size: u64,
    /// Maximum number of pages the table can hold.
    pub max_pages: usize,
}

impl PageGeometry {
    /// Creates a new geometry.
    #[must_use]
    pub const fn new(page_size: u64, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }

    /// Total number of addressable bytes.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.page_size.saturating_mul(self.max_pages as u64)
    }

    /// Index of the page containing `offset`.
    #[must_use]
    pub const fn page_of(&self, offset: u64) -> usize {
        (offset / self.page_size) as usize
    }

    /// Position of `offset` inside its page.
    #[must_use]
    pub const fn page_offset(&self, offset: u64) -> u64 {
        offset % self.page_size
    }

    /// File offset of the first byte of `page`.
    #[must_use]
    pub const fn page_start(&self, page: usize) -> u64 {
        page as u64 * self.page_size
    }

    /// Returns whether `len` bytes at `offset` lie inside a single page.
    #[must_use]
    pub const fn fits(&self, offset: u64, len: u64) -> bool {
        len <= self.page_size - self.page_offset(offset)
    }
}

enum PageMap {
    Read(Mmap),
    Write(MmapMut),
}

struct MappedPage {
    index: usize,
    map: PageMap,
}

/// Maps fixed-size pages of a [`LogFile`] on first touch.
///
/// Page base addresses live in a lock-free table indexed by page number, so
/// resolving an offset on an already mapped page costs one atomic load. Only
/// creating a page takes the allocation lock, which also owns the mappings.
/// Pages stay mapped until the manager is dropped, which is what allows
/// [`PageManager::slice`] and [`PageManager::words`] to hand out references
/// bound to `&self`.
///
/// # Thread Safety
///
/// The manager is `Send + Sync`. Several managers may map the same file,
/// in this process or others; they observe each other's writes through the
/// shared file mapping.
pub struct PageManager {
    file: LogFile,
    geometry: PageGeometry,
    bases: Box<[AtomicPtr<u8>]>,
    pages: Mutex<Vec<MappedPage>>,
}

impl fmt::Debug for PageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageManager")
            .field("file", &self.file)
            .field("geometry", &self.geometry)
            .field("mapped_pages", &self.mapped_pages())
            .finish()
    }
}

impl PageManager {
    /// Creates a page manager over `file`. No page is mapped yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] if the page size is zero, not a
    /// multiple of [`WORD_SIZE`], or does not fit in the address space, and
    /// [`StorageError::PageOutOfRange`] if `max_pages` is zero.
    pub fn new(file: LogFile, geometry: PageGeometry) -> StorageResult<Self> {
        if geometry.page_size == 0
            || geometry.page_size % WORD_SIZE != 0
            || usize::try_from(geometry.page_size).is_err()
        {
            return Err(StorageError::InvalidRange {
                offset: 0,
                len: geometry.page_size,
            });
        }
        if geometry.max_pages == 0 {
            return Err(StorageError::PageOutOfRange {
                page: 0,
                max_pages: 0,
            });
        }

        let bases = (0..geometry.max_pages)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();

        Ok(Self {
            file,
            geometry,
            bases,
            pages: Mutex::new(Vec::new()),
        })
    }

    /// Returns the page geometry.
    #[must_use]
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Returns the backing file.
    #[must_use]
    pub fn file(&self) -> &LogFile {
        &self.file
    }

    /// Returns whether pages are mapped read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.file.is_read_only()
    }

    /// Returns whether `page` is currently mapped.
    #[must_use]
    pub fn is_mapped(&self, page: usize) -> bool {
        self.bases
            .get(page)
            .is_some_and(|slot| !slot.load(Ordering::Acquire).is_null())
    }

    /// Number of mapped pages.
    #[must_use]
    pub fn mapped_pages(&self) -> usize {
        self.pages.lock().len()
    }

    /// Maps `page` if it is not mapped yet.
    ///
    /// A writable file is extended to cover the page first. A read-only file
    /// that does not cover the page yields [`StorageError::EndOfFile`].
    ///
    /// # Errors
    ///
    /// Returns an error if the page index is out of range, the file cannot be
    /// extended, the file is too short (read-only), or mapping fails.
    pub fn ensure_page(&self, page: usize) -> StorageResult<()> {
        self.page_base(page).map(|_| ())
    }

    /// Maps every unmapped page up to and including `last`.
    ///
    /// Walks back from `last` to the highest mapped page, then maps forward,
    /// all under the allocation lock.
    ///
    /// # Errors
    ///
    /// Returns the first mapping failure; pages mapped before it stay mapped.
    pub fn ensure_through(&self, last: usize) -> StorageResult<()> {
        if last >= self.geometry.max_pages {
            return Err(StorageError::PageOutOfRange {
                page: last,
                max_pages: self.geometry.max_pages,
            });
        }
        if self.is_mapped(last) {
            return Ok(());
        }

        let mut pages = self.pages.lock();
        let mut first = last;
        while first > 0 && !self.is_mapped(first - 1) {
            first -= 1;
        }
        for page in first..=last {
            self.map_locked(&mut pages, page)?;
        }
        Ok(())
    }

    /// Resolves `len` bytes at `offset` to an address inside a mapped page.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] if the range crosses a page
    /// boundary, or any error from mapping the page.
    #[allow(unsafe_code)]
    pub fn resolve(&self, offset: u64, len: u64) -> StorageResult<NonNull<u8>> {
        if !self.geometry.fits(offset, len) {
            return Err(StorageError::InvalidRange { offset, len });
        }
        let base = self.page_base(self.geometry.page_of(offset))?;
        let in_page = self.geometry.page_offset(offset) as usize;
        // SAFETY: `in_page + len <= page_size`, and the mapping is `page_size`
        // bytes long.
        Ok(unsafe { base.add(in_page) })
    }

    /// Returns `count` consecutive 64-bit atomics starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] if `offset` is not word aligned
    /// or the words cross a page boundary.
    #[allow(unsafe_code)]
    pub fn words(&self, offset: u64, count: usize) -> StorageResult<&[AtomicU64]> {
        let len = count as u64 * WORD_SIZE;
        if offset % WORD_SIZE != 0 {
            return Err(StorageError::InvalidRange { offset, len });
        }
        let ptr = self.resolve(offset, len)?;
        // SAFETY: the range is inside a mapping that lives as long as `self`.
        // Page bases are OS-page aligned and `offset` is word aligned, so the
        // pointer satisfies `AtomicU64` alignment. `AtomicU64` has the same
        // in-memory representation as `u64`.
        Ok(unsafe { slice::from_raw_parts(ptr.as_ptr().cast::<AtomicU64>(), count) })
    }

    /// Returns `len` bytes at `offset` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the range crosses a page boundary or the page
    /// cannot be mapped.
    #[allow(unsafe_code)]
    pub fn slice(&self, offset: u64, len: u64) -> StorageResult<&[u8]> {
        let ptr = self.resolve(offset, len)?;
        // SAFETY: the range is inside a mapping that lives as long as `self`.
        Ok(unsafe { slice::from_raw_parts(ptr.as_ptr(), len as usize) })
    }

    /// Returns `len` bytes at `offset` for writing.
    ///
    /// # Safety
    ///
    /// The caller must have exclusive access to the range for the lifetime of
    /// the returned slice: no other reference, in this process or another,
    /// may read or write those bytes meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only file, or an error if
    /// the range crosses a page boundary or the page cannot be mapped.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub unsafe fn slice_mut(&self, offset: u64, len: u64) -> StorageResult<&mut [u8]> {
        if self.is_read_only() {
            return Err(StorageError::ReadOnly);
        }
        let ptr = self.resolve(offset, len)?;
        // SAFETY: the mapping is writable and lives as long as `self`;
        // exclusivity is guaranteed by the caller.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len as usize) })
    }

    /// Schedules write-back of every mapped page without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns the first flush failure.
    pub fn flush_async(&self) -> StorageResult<()> {
        let pages = self.pages.lock();
        for page in pages.iter() {
            if let PageMap::Write(map) = &page.map {
                map.flush_async()?;
            }
        }
        Ok(())
    }

    /// Writes every mapped page back to disk and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns the first flush failure.
    pub fn flush(&self) -> StorageResult<()> {
        let pages = self.pages.lock();
        for page in pages.iter() {
            if let PageMap::Write(map) = &page.map {
                map.flush()?;
            }
        }
        drop(pages);
        self.file.sync_all()
    }

    fn page_base(&self, page: usize) -> StorageResult<NonNull<u8>> {
        let slot = self.bases.get(page).ok_or(StorageError::PageOutOfRange {
            page,
            max_pages: self.geometry.max_pages,
        })?;
        if let Some(base) = NonNull::new(slot.load(Ordering::Acquire)) {
            return Ok(base);
        }

        let mut pages = self.pages.lock();
        self.map_locked(&mut pages, page)
    }

    #[allow(unsafe_code)]
    fn map_locked(&self, pages: &mut Vec<MappedPage>, page: usize) -> StorageResult<NonNull<u8>> {
        let slot = &self.bases[page];
        if let Some(base) = NonNull::new(slot.load(Ordering::Acquire)) {
            return Ok(base);
        }

        let start = self.geometry.page_start(page);
        let required = start + self.geometry.page_size;
        let read_only = self.file.is_read_only();
        if read_only {
            let file_size = self.file.len()?;
            if file_size < required {
                return Err(StorageError::EndOfFile {
                    page,
                    required,
                    file_size,
                });
            }
        } else {
            self.file.ensure_len(required)?;
        }

        let mut options = MmapOptions::new();
        options.offset(start).len(self.geometry.page_size as usize);

        let mut map = if read_only {
            // SAFETY: the file is shared with other handles by design; all
            // mutation of mapped bytes goes through atomics or through
            // exclusively reserved ranges.
            let map = unsafe { options.map(self.file.file()) }
                .map_err(|e| StorageError::from_map(page, e))?;
            PageMap::Read(map)
        } else {
            // SAFETY: as above.
            let map = unsafe { options.map_mut(self.file.file()) }
                .map_err(|e| StorageError::from_map(page, e))?;
            PageMap::Write(map)
        };

        let base = match &mut map {
            PageMap::Read(map) => map.as_ptr().cast_mut(),
            PageMap::Write(map) => map.as_mut_ptr(),
        };
        let base = NonNull::new(base).ok_or_else(|| {
            StorageError::from_map(page, std::io::Error::other("mmap returned null"))
        })?;

        pages.push(MappedPage { index: page, map });
        slot.store(base.as_ptr(), Ordering::Release);
        tracing::debug!(page, read_only, "mapped page");
        Ok(base)
    }
}

impl Drop for PageManager {
    fn drop(&mut self) {
        let pages = self.pages.get_mut();
        for page in pages.iter() {
            if let PageMap::Write(map) = &page.map {
                if let Err(e) = map.flush_async() {
                    tracing::warn!(page = page.index, error = %e, "flush on unmap failed");
                }
            }
        }
    }
}
