//! Producer framing: the first field of every framed record.

use super::{framed_size, read_field, write_field, ProducerId, FRAME_FIELD_SIZE};
use crate::error::YamalResult;
use crate::yamal::{Iter, Record, Reservation, Yamal};
use std::ops::{Deref, DerefMut};

/// A reservation with room for a producer field.
///
/// Dereferences to the bytes after the producer field.
#[derive(Debug)]
pub struct ProducerReservation<'a> {
    inner: Reservation<'a>,
}

impl ProducerReservation<'_> {
    /// File offset of the reserved record.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.inner.offset()
    }
}

impl Deref for ProducerReservation<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner[FRAME_FIELD_SIZE..]
    }
}

impl DerefMut for ProducerReservation<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner[FRAME_FIELD_SIZE..]
    }
}

/// A record with its producer field decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerRecord<'a> {
    /// File offset of the record.
    pub offset: u64,
    /// Sequence number assigned at commit.
    pub seqno: u64,
    /// Who wrote the record.
    pub producer: ProducerId,
    /// Bytes after the producer field.
    pub data: &'a [u8],
}

/// Reserves a record with `size` bytes after the producer field.
///
/// # Errors
///
/// Any error from [`Yamal::reserve`].
pub fn reserve(log: &Yamal, size: usize) -> YamalResult<ProducerReservation<'_>> {
    let inner = log.reserve(framed_size(size)?)?;
    Ok(ProducerReservation { inner })
}

/// Stamps `producer` on the reservation and commits it.
///
/// # Errors
///
/// Any error from [`Yamal::commit`].
pub fn commit(
    log: &Yamal,
    producer: ProducerId,
    mut reservation: ProducerReservation<'_>,
) -> YamalResult<Iter> {
    write_field(&mut reservation.inner, producer.0);
    log.commit(reservation.inner)
}

/// Writes an announcement record carrying a producer's name.
///
/// # Errors
///
/// Any error from reserving or committing the record.
pub fn announce(log: &Yamal, name: &[u8]) -> YamalResult<Iter> {
    let mut reservation = reserve(log, name.len())?;
    reservation.copy_from_slice(name);
    commit(log, ProducerId::ANNOUNCEMENT, reservation)
}

/// Decodes the producer field of a record.
///
/// # Errors
///
/// Returns [`YamalError::InvalidFormat`](crate::YamalError::InvalidFormat) if
/// the record is shorter than a producer field.
pub fn parse(record: Record<'_>) -> YamalResult<ProducerRecord<'_>> {
    let (producer, data) = read_field(record.data, record.offset, "producer")?;
    Ok(ProducerRecord {
        offset: record.offset,
        seqno: record.seqno,
        producer: ProducerId(producer),
        data,
    })
}

/// Reads the record `iterator` points at and decodes its producer field.
///
/// # Errors
///
/// Any error from [`Yamal::read`] or [`parse`].
pub fn read(log: &Yamal, iterator: Iter) -> YamalResult<ProducerRecord<'_>> {
    parse(log.read(iterator)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::Config;
    use tempfile::{tempdir, TempDir};

    fn temp_log() -> (TempDir, Yamal) {
        let dir = tempdir().unwrap();
        let config = Config::new()
            .page_size(64 * 1024)
            .prealloc_size(0)
            .max_pages(8)
            .maintenance(false);
        let log = Yamal::open(dir.path().join("producer.ytp"), config).unwrap();
        (dir, log)
    }

    #[test]
    fn commit_and_read() {
        let (_dir, log) = temp_log();
        let mut reservation = reserve(&log, 3).unwrap();
        assert_eq!(reservation.len(), 3);
        reservation.copy_from_slice(b"abc");
        let it = commit(&log, ProducerId(42), reservation).unwrap();

        let record = read(&log, it).unwrap();
        assert_eq!(record.producer, ProducerId(42));
        assert_eq!(record.data, b"abc");
        assert_eq!(record.seqno, 1);

        let raw = log.read(it).unwrap();
        assert_eq!(&raw.data[..8], &42u64.to_be_bytes());
    }

    #[test]
    fn announce_names_producer() {
        let (_dir, log) = temp_log();
        let it = announce(&log, b"peer1").unwrap();
        let record = read(&log, it).unwrap();
        assert!(record.producer.is_announcement());
        assert_eq!(record.data, b"peer1");
    }

    #[test]
    fn empty_announcement() {
        let (_dir, log) = temp_log();
        let it = announce(&log, b"").unwrap();
        assert!(read(&log, it).unwrap().data.is_empty());
    }

    #[test]
    fn unframed_record_is_invalid_format() {
        let (_dir, log) = temp_log();
        let mut reservation = log.reserve(4).unwrap();
        reservation.copy_from_slice(b"raw!");
        let it = log.commit(reservation).unwrap();
        assert_eq!(read(&log, it).unwrap_err().kind(), ErrorKind::InvalidFormat);
    }
}
