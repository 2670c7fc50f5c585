//! Topic framing, layered on [`producer`](super::producer).

use super::producer::{self, ProducerRecord, ProducerReservation};
use super::{framed_size, read_field, write_field, ProducerId, TopicId, FRAME_FIELD_SIZE};
use crate::error::{YamalError, YamalResult};
use crate::yamal::{Iter, Record, Yamal};
use std::ops::{Deref, DerefMut};

/// A reservation with room for producer and topic fields.
#[derive(Debug)]
pub struct TopicReservation<'a> {
    inner: ProducerReservation<'a>,
}

impl TopicReservation<'_> {
    /// File offset of the reserved record.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.inner.offset()
    }
}

impl Deref for TopicReservation<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner[FRAME_FIELD_SIZE..]
    }
}

impl DerefMut for TopicReservation<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner[FRAME_FIELD_SIZE..]
    }
}

/// A record with producer and topic decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRecord<'a> {
    /// File offset of the record.
    pub offset: u64,
    /// Sequence number assigned at commit.
    pub seqno: u64,
    /// Who wrote the record.
    pub producer: ProducerId,
    /// Topic, absent for announcements.
    pub topic: Option<TopicId>,
    /// Bytes after the topic field (after the producer field for announcements).
    pub data: &'a [u8],
}

/// Reserves a record with `size` bytes after the topic field.
///
/// # Errors
///
/// Any error from [`Yamal::reserve`].
pub fn reserve(log: &Yamal, size: usize) -> YamalResult<TopicReservation<'_>> {
    let inner = producer::reserve(log, framed_size(size)?)?;
    Ok(TopicReservation { inner })
}

/// Stamps producer and topic on the reservation and commits it.
///
/// # Errors
///
/// Returns [`YamalError::ReservedProducer`] for the announcement producer;
/// the reservation is then dropped without being linked.
pub fn commit(
    log: &Yamal,
    producer: ProducerId,
    topic: TopicId,
    mut reservation: TopicReservation<'_>,
) -> YamalResult<Iter> {
    if producer.is_announcement() {
        return Err(YamalError::ReservedProducer);
    }
    write_field(&mut reservation.inner, topic.0);
    producer::commit(log, producer, reservation.inner)
}

fn from_producer(record: ProducerRecord<'_>) -> YamalResult<TopicRecord<'_>> {
    let (topic, data) = if record.producer.is_announcement() {
        (None, record.data)
    } else {
        let (topic, data) = read_field(record.data, record.offset, "topic")?;
        (Some(TopicId(topic)), data)
    };
    Ok(TopicRecord {
        offset: record.offset,
        seqno: record.seqno,
        producer: record.producer,
        topic,
        data,
    })
}

/// Decodes the producer and topic fields of a record.
///
/// # Errors
///
/// Returns [`YamalError::InvalidFormat`] if a field is truncated.
pub fn parse(record: Record<'_>) -> YamalResult<TopicRecord<'_>> {
    from_producer(producer::parse(record)?)
}

/// Reads the record `iterator` points at and decodes producer and topic.
///
/// # Errors
///
/// Any error from [`Yamal::read`] or [`parse`].
pub fn read(log: &Yamal, iterator: Iter) -> YamalResult<TopicRecord<'_>> {
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
        let log = Yamal::open(dir.path().join("topic.ytp"), config).unwrap();
        (dir, log)
    }

    #[test]
    fn commit_and_read() {
        let (_dir, log) = temp_log();
        let mut reservation = reserve(&log, 2).unwrap();
        reservation.copy_from_slice(b"hi");
        let it = commit(&log, ProducerId(1), TopicId(9), reservation).unwrap();

        let record = read(&log, it).unwrap();
        assert_eq!(record.producer, ProducerId(1));
        assert_eq!(record.topic, Some(TopicId(9)));
        assert_eq!(record.data, b"hi");
    }

    #[test]
    fn announcement_has_no_topic() {
        let (_dir, log) = temp_log();
        let it = producer::announce(&log, b"peer1").unwrap();
        let record = read(&log, it).unwrap();
        assert_eq!(record.topic, None);
        assert_eq!(record.data, b"peer1");
    }

    #[test]
    fn announcement_producer_is_rejected() {
        let (_dir, log) = temp_log();
        let reservation = reserve(&log, 4).unwrap();
        let err = commit(&log, ProducerId::ANNOUNCEMENT, TopicId(1), reservation).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReservedProducer);
        assert!(log.is_term(log.begin()).unwrap());
    }
}
