//! Time framing, layered on [`topic`](super::topic).
//!
//! The innermost framing layer: producer, topic and a signed 64-bit timestamp
//! (nanoseconds by convention; the log does not interpret it).

use super::topic::{self, TopicRecord, TopicReservation};
use super::{framed_size, read_field, write_field, ProducerId, TopicId, FRAME_FIELD_SIZE};
use crate::error::{YamalError, YamalResult};
use crate::yamal::{Iter, Record, Yamal};
use std::ops::{Deref, DerefMut};

/// A reservation with room for producer, topic and timestamp fields.
#[derive(Debug)]
pub struct TimeReservation<'a> {
    inner: TopicReservation<'a>,
}

impl TimeReservation<'_> {
    /// File offset of the reserved record.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.inner.offset()
    }
}

impl Deref for TimeReservation<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner[FRAME_FIELD_SIZE..]
    }
}

impl DerefMut for TimeReservation<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner[FRAME_FIELD_SIZE..]
    }
}

/// A fully framed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRecord<'a> {
    /// File offset of the record.
    pub offset: u64,
    /// Sequence number assigned at commit.
    pub seqno: u64,
    /// Who wrote the record.
    pub producer: ProducerId,
    /// Topic, absent for announcements.
    pub topic: Option<TopicId>,
    /// Timestamp, absent for announcements.
    pub timestamp: Option<i64>,
    /// Payload.
    pub data: &'a [u8],
}

/// Reserves a record with a `size`-byte payload.
///
/// # Errors
///
/// Any error from [`Yamal::reserve`].
pub fn reserve(log: &Yamal, size: usize) -> YamalResult<TimeReservation<'_>> {
    let inner = topic::reserve(log, framed_size(size)?)?;
    Ok(TimeReservation { inner })
}

/// Stamps producer, topic and timestamp on the reservation and commits it.
///
/// # Errors
///
/// Returns [`YamalError::ReservedProducer`] for the announcement producer.
pub fn commit(
    log: &Yamal,
    producer: ProducerId,
    topic: TopicId,
    timestamp: i64,
    mut reservation: TimeReservation<'_>,
) -> YamalResult<Iter> {
    if producer.is_announcement() {
        return Err(YamalError::ReservedProducer);
    }
    write_field(&mut reservation.inner, timestamp as u64);
    topic::commit(log, producer, topic, reservation.inner)
}

fn from_topic(record: TopicRecord<'_>) -> YamalResult<TimeRecord<'_>> {
    let (timestamp, data) = if record.topic.is_none() {
        (None, record.data)
    } else {
        let (timestamp, data) = read_field(record.data, record.offset, "timestamp")?;
        (Some(timestamp as i64), data)
    };
    Ok(TimeRecord {
        offset: record.offset,
        seqno: record.seqno,
        producer: record.producer,
        topic: record.topic,
        timestamp,
        data,
    })
}

/// Decodes every framing field of a record.
///
/// # Errors
///
/// Returns [`YamalError::InvalidFormat`] if a field is truncated.
pub fn parse(record: Record<'_>) -> YamalResult<TimeRecord<'_>> {
    from_topic(topic::parse(record)?)
}

/// Reads the record `iterator` points at and decodes every framing field.
///
/// # Errors
///
/// Any error from [`Yamal::read`] or [`parse`].
pub fn read(log: &Yamal, iterator: Iter) -> YamalResult<TimeRecord<'_>> {
    parse(log.read(iterator)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::framing::producer;
    use crate::Config;
    use proptest::prelude::*;
    use tempfile::{tempdir, TempDir};

    fn temp_log() -> (TempDir, Yamal) {
        let dir = tempdir().unwrap();
        let config = Config::new()
            .page_size(64 * 1024)
            .prealloc_size(0)
            .max_pages(64)
            .maintenance(false);
        let log = Yamal::open(dir.path().join("time.ytp"), config).unwrap();
        (dir, log)
    }

    #[test]
    fn framed_record_round_trip() {
        let (_dir, log) = temp_log();
        let mut reservation = reserve(&log, 4).unwrap();
        reservation.copy_from_slice(b"ABCD");
        let it = commit(&log, ProducerId(1), TopicId(2), 1000, reservation).unwrap();

        let record = read(&log, it).unwrap();
        assert_eq!(record.producer, ProducerId(1));
        assert_eq!(record.topic, Some(TopicId(2)));
        assert_eq!(record.timestamp, Some(1000));
        assert_eq!(record.data, b"ABCD");

        let raw = log.read(it).unwrap();
        assert_eq!(raw.data.len(), 3 * FRAME_FIELD_SIZE + 4);
        assert_eq!(&raw.data[16..24], &1000i64.to_be_bytes());
    }

    #[test]
    fn announcement_has_no_topic_or_timestamp() {
        let (_dir, log) = temp_log();
        let it = producer::announce(&log, b"peer1").unwrap();
        let record = read(&log, it).unwrap();
        assert_eq!(record.producer, ProducerId::ANNOUNCEMENT);
        assert_eq!(record.topic, None);
        assert_eq!(record.timestamp, None);
        assert_eq!(record.data, b"peer1");
    }

    #[test]
    fn negative_timestamps_survive() {
        let (_dir, log) = temp_log();
        let reservation = reserve(&log, 1).unwrap();
        let it = commit(&log, ProducerId(3), TopicId(4), -5, reservation).unwrap();
        assert_eq!(read(&log, it).unwrap().timestamp, Some(-5));
    }

    #[test]
    fn announcement_producer_is_rejected() {
        let (_dir, log) = temp_log();
        let reservation = reserve(&log, 1).unwrap();
        let err = commit(&log, ProducerId(0), TopicId(4), 5, reservation).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReservedProducer);
        assert!(log.is_term(log.begin()).unwrap());
    }

    #[test]
    fn truncated_timestamp_is_invalid_format() {
        let (_dir, log) = temp_log();
        let mut reservation = topic::reserve(&log, 3).unwrap();
        reservation.copy_from_slice(b"abc");
        let it = topic::commit(&log, ProducerId(1), TopicId(1), reservation).unwrap();
        assert_eq!(read(&log, it).unwrap_err().kind(), ErrorKind::InvalidFormat);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn framing_preserves_fields_and_payload(
            producer in 1u64..,
            topic in any::<u64>(),
            timestamp in any::<i64>(),
            payload in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let (_dir, log) = temp_log();
            let mut reservation = reserve(&log, payload.len()).unwrap();
            reservation.copy_from_slice(&payload);
            let it = commit(&log, ProducerId(producer), TopicId(topic), timestamp, reservation)
                .unwrap();

            let record = read(&log, it).unwrap();
            prop_assert_eq!(record.producer, ProducerId(producer));
            prop_assert_eq!(record.topic, Some(TopicId(topic)));
            prop_assert_eq!(record.timestamp, Some(timestamp));
            prop_assert_eq!(record.data, payload.as_slice());
        }
    }
}
