//! The append log.
//!
//! Records form a doubly linked list threaded through the mapped file. The
//! header record at offset 0 is the list's sentinel: its forward link is the
//! first record, its backward link is a hint to the last one.
//!
//! Writers never take a lock. Space is claimed by advancing the header's
//! write frontier with a compare-and-swap, and a reserved record becomes
//! visible only when [`Yamal::commit`] links it after the current tail, again
//! with a compare-and-swap. Once linked, a record's position is fixed.
//!
//! ## Iterators
//!
//! An [`Iter`] names the record whose forward link it looks through; the
//! record it *reads* is the one that link points to. [`Yamal::begin`] looks
//! through the header, so reading it yields the first record. When the link
//! is zero, ignoring a removal mark, the iterator is terminal. The offset
//! inside an `Iter` is stable across restarts ([`Yamal::tell`] /
//! [`Yamal::seek`]).
//!
//! ```text
//!   begin()            next()             next()
//!     |                  |                  |
//!   [hdr] --next--> [rec A] --next--> [rec B] --next--> 0
//!         <--prev--         <--prev--
//! ```

use crate::config::Config;
use crate::error::{YamalError, YamalResult};
use crate::layout::{
    node_size, ByteOrder, HEADER_SIZE, MARKED, NEXT_FIELD, NODE_HEADER_SIZE, NODE_WORDS,
    PREV_FIELD, SEQNO_FIELD, SIGNATURE, SIGNATURE_OFFSET, SIZE_FIELD,
};
use crate::maintenance::Maintenance;
use std::fmt;
use std::fs::File;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::hint;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use yamal_storage::{LogFile, PageManager, WORD_SIZE};

/// A traversal position, persistable as a file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iter(u64);

impl Iter {
    /// The position before the first record.
    pub const BEGIN: Self = Self(0);

    /// Offset of the record whose forward link this iterator looks through.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.0
    }
}

/// A committed record, borrowed from the mapped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// File offset of the record.
    pub offset: u64,
    /// Sequence number assigned at commit.
    pub seqno: u64,
    /// Payload bytes.
    pub data: &'a [u8],
}

/// Space claimed by [`Yamal::reserve`], not yet visible to readers.
///
/// Dereferences to the zero-filled payload. Dropping a reservation without
/// committing it leaves the space claimed but never linked.
pub struct Reservation<'a> {
    owner: &'a Shared,
    offset: u64,
    data: &'a mut [u8],
}

impl Reservation<'_> {
    /// File offset of the reserved record.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Debug for Reservation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("offset", &self.offset)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Deref for Reservation<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl DerefMut for Reservation<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data
    }
}

/// A node header viewed as four atomics.
#[derive(Clone, Copy)]
struct Node<'a> {
    offset: u64,
    fields: &'a [AtomicU64],
}

impl<'a> Node<'a> {
    fn size(&self) -> &'a AtomicU64 {
        &self.fields[SIZE_FIELD]
    }

    fn next(&self) -> &'a AtomicU64 {
        &self.fields[NEXT_FIELD]
    }

    fn prev(&self) -> &'a AtomicU64 {
        &self.fields[PREV_FIELD]
    }

    fn seqno(&self) -> &'a AtomicU64 {
        &self.fields[SEQNO_FIELD]
    }
}

/// State shared between a handle and its maintenance thread.
pub(crate) struct Shared {
    pages: PageManager,
    config: Config,
}

impl Shared {
    fn order(&self) -> ByteOrder {
        self.config.byte_order
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    fn node(&self, offset: u64) -> YamalResult<Node<'_>> {
        let fields = self.pages.words(offset, NODE_WORDS)?;
        Ok(Node { offset, fields })
    }

    fn header(&self) -> YamalResult<Node<'_>> {
        self.node(0)
    }

    fn link(&self, field: &AtomicU64) -> u64 {
        self.order().decode(field.load(Ordering::Acquire))
    }

    pub(crate) fn reserved_size(&self) -> YamalResult<u64> {
        let header = self.header()?;
        Ok(self.order().decode(header.size().load(Ordering::Relaxed)))
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.pages.is_read_only()
    }

    /// Maps every page up to `prealloc_size` bytes past the write frontier.
    pub(crate) fn preallocate_ahead(&self) -> YamalResult<()> {
        let geometry = self.pages.geometry();
        let target = self
            .reserved_size()?
            .saturating_add(self.config.prealloc_size)
            .min(geometry.capacity() - 1);
        self.pages.ensure_through(geometry.page_of(target))?;
        Ok(())
    }

    pub(crate) fn flush_async(&self) -> YamalResult<()> {
        self.pages.flush_async()?;
        Ok(())
    }

    fn initialize(&self) -> YamalResult<()> {
        let order = self.order();
        let header = self.header()?;
        let signature_word = &self.pages.words(SIGNATURE_OFFSET, 1)?[0];
        let signature = u64::from_ne_bytes(SIGNATURE);

        if self.is_read_only() {
            if signature_word.load(Ordering::Acquire) != signature {
                return Err(YamalError::invalid_format("signature mismatch"));
            }
        } else {
            // The frontier goes first so that anyone seeing the signature also
            // sees an initialized frontier.
            expect_or_init(header.size(), order.encode(HEADER_SIZE));
            if !expect_or_init(signature_word, signature) {
                return Err(YamalError::invalid_format("signature mismatch"));
            }
        }

        let frontier = order.decode(header.size().load(Ordering::Acquire));
        let capacity = self.config.capacity();
        if frontier < HEADER_SIZE || frontier > capacity || frontier % WORD_SIZE != 0 {
            return Err(YamalError::invalid_format(format!(
                "write frontier {frontier} outside [{HEADER_SIZE}, {capacity}]; \
                 byte order or page geometry differs from the writer"
            )));
        }
        Ok(())
    }

    /// Advances the write frontier by `node_size`, skipping to the next page
    /// when the node would straddle a page boundary.
    fn claim(&self, node_size: u64) -> YamalResult<u64> {
        let order = self.order();
        let geometry = self.pages.geometry();
        let frontier = self.header()?.size();

        let mut current = frontier.load(Ordering::Relaxed);
        loop {
            let end = order.decode(current);
            let start = if geometry.fits(end, node_size) {
                end
            } else {
                geometry.page_start(geometry.page_of(end) + 1)
            };
            let new_end = start + node_size;
            if new_end > geometry.capacity() {
                return Err(YamalError::Full {
                    requested: node_size,
                    frontier: end,
                    capacity: geometry.capacity(),
                });
            }
            match frontier.compare_exchange_weak(
                current,
                order.encode(new_end),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(start),
                Err(actual) => current = actual,
            }
        }
    }

    /// Follows forward links from `offset` until a node without one.
    ///
    /// A tail claimed by a removal carries a marked zero link; the walk steps
    /// back to its predecessor, which takes its place once the removal
    /// finishes (or finds the tail again if the removal gives up).
    fn walk_to_tail(&self, offset: u64) -> YamalResult<Node<'_>> {
        let mut node = self.node(offset)?;
        loop {
            let next = self.link(node.next());
            if next == 0 {
                return Ok(node);
            }
            let target = if next == MARKED {
                hint::spin_loop();
                self.link(node.prev())
            } else {
                next & !MARKED
            };
            node = self.node(target)?;
        }
    }

    /// Offset of the record `iterator` currently points at.
    fn current(&self, iterator: Iter) -> YamalResult<u64> {
        let at = self.node(iterator.0)?;
        match self.link(at.next()) & !MARKED {
            0 => Err(YamalError::InvalidOffset { offset: iterator.0 }),
            offset => Ok(offset),
        }
    }

    /// Marks `node`'s forward link, retrying while commits or completed
    /// removals change it. Returns the unmarked follower.
    fn claim_forward_link(&self, node: Node<'_>) -> YamalResult<u64> {
        let order = self.order();
        let mut follower = self.link(node.next());
        loop {
            if follower & MARKED != 0 {
                return Err(YamalError::lost_race(format!(
                    "record at {} is already removed or being removed",
                    node.offset
                )));
            }
            match node.next().compare_exchange(
                order.encode(follower),
                order.encode(follower | MARKED),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(follower),
                Err(actual) => follower = order.decode(actual),
            }
        }
    }

    /// With `node`'s forward link claimed, marks its predecessor's link to it
    /// and resolves the follower. Returns both nodes.
    fn claim_neighbours<'s>(
        &'s self,
        node: Node<'s>,
        follower: u64,
    ) -> YamalResult<(Node<'s>, Option<Node<'s>>)> {
        let order = self.order();
        let follower = match follower {
            0 => None,
            offset => Some(self.node(offset)?),
        };
        let prev = self.node(self.link(node.prev()))?;
        prev.next()
            .compare_exchange(
                order.encode(node.offset),
                order.encode(node.offset | MARKED),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| {
                YamalError::lost_race(format!(
                    "predecessor of record at {} changed during removal",
                    node.offset
                ))
            })?;
        Ok((prev, follower))
    }
}

/// Whether a decoded forward link ends traversal.
fn is_terminal(next: u64) -> bool {
    next & !MARKED == 0
}

fn expect_or_init(field: &AtomicU64, desired: u64) -> bool {
    match field.compare_exchange(0, desired, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => true,
        Err(actual) => actual == desired,
    }
}

/// A handle on a memory-mapped append log.
///
/// Any number of handles, in any number of threads or processes, may open the
/// same file and reserve, commit, read, traverse and remove concurrently.
/// A handle is `Send + Sync`; share one across threads with `&` or `Arc`.
///
/// # Example
///
/// ```rust
/// use yamal_core::{Config, Yamal};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = Config::new().page_size(64 * 1024).prealloc_size(16 * 1024).max_pages(16);
/// let log = Yamal::open(dir.path().join("data.ytp"), config).unwrap();
///
/// let mut reservation = log.reserve(5).unwrap();
/// reservation.copy_from_slice(b"hello");
/// let it = log.commit(reservation).unwrap();
///
/// let record = log.read(it).unwrap();
/// assert_eq!(record.data, b"hello");
/// assert!(log.is_term(log.next(it).unwrap()).unwrap());
/// ```
pub struct Yamal {
    shared: Arc<Shared>,
    maintenance: Option<Maintenance>,
}

impl fmt::Debug for Yamal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Yamal")
            .field("pages", &self.shared.pages)
            .field("config", &self.shared.config)
            .field("maintenance", &self.maintenance.is_some())
            .finish()
    }
}

impl Yamal {
    /// Opens (or creates) the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the file cannot be
    /// opened or mapped, or it is not a yamal log.
    pub fn open(path: impl AsRef<Path>, config: Config) -> YamalResult<Self> {
        config.validate()?;
        let file = LogFile::open(path.as_ref(), config.read_only, config.create_if_missing)?;
        Self::with_file(file, config)
    }

    /// Opens a log over an already open file.
    ///
    /// `config.read_only` must match the file's access mode.
    ///
    /// # Errors
    ///
    /// Same as [`Yamal::open`].
    pub fn from_file(file: File, config: Config) -> YamalResult<Self> {
        config.validate()?;
        Self::with_file(LogFile::from_file(file, config.read_only), config)
    }

    fn with_file(file: LogFile, config: Config) -> YamalResult<Self> {
        let pages = PageManager::new(file, config.geometry())?;
        let shared = Arc::new(Shared { pages, config });
        shared.initialize()?;

        let mut maintenance = None;
        if !shared.is_read_only() {
            shared.preallocate_ahead()?;
            if shared.config.maintenance {
                maintenance = Some(Maintenance::spawn(Arc::clone(&shared))?);
            }
        }

        tracing::debug!(
            path = ?shared.pages.file().path(),
            read_only = shared.is_read_only(),
            frontier = shared.reserved_size()?,
            "opened yamal log"
        );
        Ok(Self {
            shared,
            maintenance,
        })
    }

    /// Returns the configuration the log was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns whether this handle is read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.shared.is_read_only()
    }

    /// Returns the path the log was opened from, if known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.shared.pages.file().path()
    }

    /// Returns the current write frontier: total bytes reserved so far,
    /// header included.
    ///
    /// # Errors
    ///
    /// Returns an error if the header page cannot be mapped.
    pub fn reserved_size(&self) -> YamalResult<u64> {
        self.shared.reserved_size()
    }

    /// Claims space for a `size`-byte record.
    ///
    /// The record lies entirely inside one page and its payload is zeroed.
    /// It is invisible to readers until passed to [`Yamal::commit`].
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidSize`] for a zero size or a record larger
    /// than a page, [`YamalError::ReadOnly`] on a read-only handle, and
    /// [`YamalError::Full`] when the log's capacity is exhausted.
    #[allow(unsafe_code)]
    pub fn reserve(&self, size: usize) -> YamalResult<Reservation<'_>> {
        if size == 0 {
            return Err(YamalError::InvalidSize {
                size,
                reason: "size is zero",
            });
        }
        if self.is_read_only() {
            return Err(YamalError::read_only("reserve"));
        }

        let shared = &*self.shared;
        if size as u64 > shared.config.page_size - NODE_HEADER_SIZE {
            return Err(YamalError::InvalidSize {
                size,
                reason: "record does not fit in a page",
            });
        }
        let node_size = node_size(size as u64);

        let offset = shared.claim(node_size)?;
        let order = shared.order();
        let node = shared.node(offset)?;
        node.size().store(order.encode(size as u64), Ordering::Relaxed);
        node.next().store(0, Ordering::Relaxed);
        node.prev().store(order.encode(offset), Ordering::Relaxed);
        node.seqno().store(0, Ordering::Relaxed);

        // SAFETY: the frontier CAS in `claim` handed [offset, offset + node_size)
        // to this call alone, and the record is not linked, so nothing else
        // can reach its payload until commit consumes the reservation.
        let data = unsafe {
            shared
                .pages
                .slice_mut(offset + NODE_HEADER_SIZE, size as u64)?
        };
        data.fill(0);

        Ok(Reservation {
            owner: shared,
            offset,
            data,
        })
    }

    /// Links a reserved record after the current tail.
    ///
    /// The returned iterator reads the committed record.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] if the reservation came from
    /// another handle, or a storage error if a page cannot be mapped.
    pub fn commit(&self, reservation: Reservation<'_>) -> YamalResult<Iter> {
        let shared = &*self.shared;
        let offset = reservation.offset;
        if !ptr::eq(reservation.owner, shared) {
            return Err(YamalError::InvalidOffset { offset });
        }

        let order = shared.order();
        let node = shared.node(offset)?;
        let header = shared.header()?;
        let mut tail = shared.walk_to_tail(shared.link(header.prev()))?;
        loop {
            node.prev().store(order.encode(tail.offset), Ordering::Relaxed);
            let seqno = order.decode(tail.seqno().load(Ordering::Relaxed)) + 1;
            node.seqno().store(order.encode(seqno), Ordering::Relaxed);

            match tail.next().compare_exchange(
                0,
                order.encode(offset),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                // Another committer linked first; continue from its record.
                Err(_) => tail = shared.walk_to_tail(tail.offset)?,
            }
        }

        header.prev().store(order.encode(offset), Ordering::Release);
        Ok(Iter(tail.offset))
    }

    /// Reads the record `iterator` points at.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] if the iterator is terminal.
    pub fn read(&self, iterator: Iter) -> YamalResult<Record<'_>> {
        let shared = &*self.shared;
        let order = shared.order();
        let offset = shared.current(iterator)?;
        let node = shared.node(offset)?;
        let size = order.decode(node.size().load(Ordering::Relaxed));
        let seqno = order.decode(node.seqno().load(Ordering::Relaxed));
        let data = shared.pages.slice(offset + NODE_HEADER_SIZE, size)?;
        Ok(Record {
            offset,
            seqno,
            data,
        })
    }

    /// Iterator positioned before the first record.
    #[must_use]
    pub fn begin(&self) -> Iter {
        Iter::BEGIN
    }

    /// Terminal iterator after the last linked record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a page cannot be mapped.
    pub fn end(&self) -> YamalResult<Iter> {
        let shared = &*self.shared;
        let header = shared.header()?;
        let tail = shared.walk_to_tail(shared.link(header.prev()))?;
        Ok(Iter(tail.offset))
    }

    /// Returns whether `iterator` has no current record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the iterator's page cannot be mapped.
    pub fn is_term(&self, iterator: Iter) -> YamalResult<bool> {
        let node = self.shared.node(iterator.0)?;
        Ok(is_terminal(self.shared.link(node.next())))
    }

    /// Moves one record forward.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] if the iterator is terminal.
    pub fn next(&self, iterator: Iter) -> YamalResult<Iter> {
        let offset = self.shared.current(iterator)?;
        self.shared.node(offset)?;
        Ok(Iter(offset))
    }

    /// Moves one record backward.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] at [`Yamal::begin`].
    pub fn prev(&self, iterator: Iter) -> YamalResult<Iter> {
        if iterator.0 == 0 {
            return Err(YamalError::InvalidOffset { offset: 0 });
        }
        let node = self.shared.node(iterator.0)?;
        let offset = self.shared.link(node.prev());
        self.shared.node(offset)?;
        Ok(Iter(offset))
    }

    /// Unlinks the record `iterator` points at.
    ///
    /// The record's bytes stay in the file; traversal no longer visits it.
    /// Returns an iterator pointing at the removed record's follower.
    ///
    /// Removal first marks the record's own forward link, then its
    /// predecessor's link to it. While both are marked no commit or other
    /// removal can touch either edge, so the follower's backward link and the
    /// predecessor's forward link are patched with plain stores. If the
    /// predecessor cannot be marked the record's link is restored and nothing
    /// has changed.
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] if the iterator is terminal,
    /// [`YamalError::ReadOnly`] on a read-only handle, and
    /// [`YamalError::LostRace`] if the record is already removed or a
    /// concurrent removal holds one of its links. A lost race leaves the
    /// list unchanged.
    pub fn remove(&self, iterator: Iter) -> YamalResult<Iter> {
        if self.is_read_only() {
            return Err(YamalError::read_only("remove"));
        }

        let shared = &*self.shared;
        let order = shared.order();
        let offset = shared.current(iterator)?;
        let current = shared.node(offset)?;

        let follower = shared.claim_forward_link(current)?;
        let (prev, next) = match shared.claim_neighbours(current, follower) {
            Ok(claimed) => claimed,
            Err(e) => {
                current.next().store(order.encode(follower), Ordering::Release);
                tracing::debug!(offset, error = %e, "removal gave up");
                return Err(e);
            }
        };

        if let Some(next) = next {
            next.prev().store(order.encode(prev.offset), Ordering::Release);
        }
        prev.next().store(order.encode(follower), Ordering::Release);

        if follower == 0 {
            let header = shared.header()?;
            if header
                .prev()
                .compare_exchange(
                    order.encode(offset),
                    order.encode(prev.offset),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_err()
            {
                tracing::debug!(offset, "tail hint already moved past removed record");
            }
        }
        Ok(Iter(prev.offset))
    }

    /// Persistable offset of `iterator`.
    #[must_use]
    pub fn tell(&self, iterator: Iter) -> u64 {
        iterator.0
    }

    /// Rebuilds an iterator from an offset returned by [`Yamal::tell`].
    ///
    /// # Errors
    ///
    /// Returns [`YamalError::InvalidOffset`] if the offset cannot name a record
    /// of this log (misaligned, past the frontier, or holding a record size
    /// that does not fit its page), or a storage error if its page cannot be
    /// mapped.
    pub fn seek(&self, offset: u64) -> YamalResult<Iter> {
        if offset == 0 {
            return Ok(Iter::BEGIN);
        }
        if offset < HEADER_SIZE || offset % WORD_SIZE != 0 || offset >= self.reserved_size()? {
            return Err(YamalError::InvalidOffset { offset });
        }
        let node = self.shared.node(offset)?;
        let size = self.shared.order().decode(node.size().load(Ordering::Relaxed));
        let fits = size
            .checked_add(NODE_HEADER_SIZE)
            .is_some_and(|len| self.shared.pages.geometry().fits(offset, len));
        if size == 0 || !fits {
            return Err(YamalError::InvalidOffset { offset });
        }
        Ok(Iter(offset))
    }

    /// Forward traversal starting at `from`.
    #[must_use]
    pub fn records(&self, from: Iter) -> Records<'_> {
        Records {
            log: self,
            position: from,
            done: false,
        }
    }

    /// Maps page `index`, extending the file if writable.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the page is out of range or cannot be mapped.
    pub fn allocate_page(&self, index: usize) -> YamalResult<()> {
        self.shared.pages.ensure_page(index)?;
        Ok(())
    }

    /// Number of pages currently mapped by this handle.
    #[must_use]
    pub fn mapped_pages(&self) -> usize {
        self.shared.pages.mapped_pages()
    }

    /// Writes every mapped page back to disk and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns the first flush failure.
    pub fn sync(&self) -> YamalResult<()> {
        self.shared.pages.flush()?;
        Ok(())
    }

    /// Stops the maintenance thread and syncs the file.
    ///
    /// Teardown always runs to completion; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failure among stopping the thread and syncing.
    pub fn close(mut self) -> YamalResult<()> {
        let mut first_error = self.stop_maintenance().err();
        if !self.is_read_only() {
            if let Err(e) = self.sync() {
                tracing::warn!(error = %e, "sync on close failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn stop_maintenance(&mut self) -> YamalResult<()> {
        match self.maintenance.take() {
            Some(mut maintenance) => maintenance.stop(),
            None => Ok(()),
        }
    }
}

impl Drop for Yamal {
    fn drop(&mut self) {
        if let Err(e) = self.stop_maintenance() {
            tracing::warn!(error = %e, "maintenance shutdown failed");
        }
    }
}

/// Forward traversal over committed records.
///
/// Yields each record together with the iterator that reads it. Stops at the
/// first terminal iterator or after the first error.
#[derive(Debug)]
pub struct Records<'a> {
    log: &'a Yamal,
    position: Iter,
    done: bool,
}

impl Records<'_> {
    /// Iterator the traversal will read next.
    #[must_use]
    pub fn position(&self) -> Iter {
        self.position
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = YamalResult<(Iter, Record<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.log.is_term(self.position) {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        }
        match self.log.read(self.position) {
            Ok(record) => {
                let at = self.position;
                self.position = Iter(record.offset);
                Some(Ok((at, record)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
