//! Producer, topic and time framing over raw log records.
//!
//! Each layer prepends one 8-byte big-endian field to the payload of the
//! layer below it, so a fully framed record reads:
//!
//! ```text
//! | producer (8) | topic (8) | timestamp (8) | payload |
//! ```
//!
//! Records from the [`ProducerId::ANNOUNCEMENT`] producer carry only the
//! producer field; their payload is a producer's human-readable name.
//! Framing fields are big-endian regardless of the log's structural
//! [`ByteOrder`](crate::ByteOrder).

pub mod producer;
pub mod time;
pub mod topic;

use crate::error::{YamalError, YamalResult};
use std::fmt;

/// Size of one framing field.
pub const FRAME_FIELD_SIZE: usize = 8;

/// Identity of the party that wrote a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(pub u64);

impl ProducerId {
    /// Producer id of announcement records.
    pub const ANNOUNCEMENT: Self = Self(0);

    /// Returns whether records from this producer are announcements.
    #[must_use]
    pub const fn is_announcement(self) -> bool {
        self.0 == Self::ANNOUNCEMENT.0
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical stream a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId(pub u64);

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload size of the layer below after adding one framing field.
fn framed_size(size: usize) -> YamalResult<usize> {
    size.checked_add(FRAME_FIELD_SIZE)
        .ok_or(YamalError::InvalidSize {
            size,
            reason: "framed size overflows",
        })
}

fn write_field(buf: &mut [u8], value: u64) {
    buf[..FRAME_FIELD_SIZE].copy_from_slice(&value.to_be_bytes());
}

/// Splits a framing field off the front of `data`.
fn read_field<'a>(data: &'a [u8], offset: u64, field: &str) -> YamalResult<(u64, &'a [u8])> {
    match data.split_first_chunk::<FRAME_FIELD_SIZE>() {
        Some((head, rest)) => Ok((u64::from_be_bytes(*head), rest)),
        None => Err(YamalError::invalid_format(format!(
            "record at {offset} is too short for a {field} field"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn fields_are_big_endian() {
        let mut buf = [0u8; 12];
        write_field(&mut buf, 0x0102_0304_0506_0708);
        assert_eq!(&buf[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let (value, rest) = read_field(&buf, 0, "test").unwrap();
        assert_eq!(value, 0x0102_0304_0506_0708);
        assert_eq!(rest.len(), 4);
    }

    #[test]
    fn short_field_is_invalid_format() {
        let err = read_field(&[0u8; 7], 40, "topic").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn announcement_producer() {
        assert!(ProducerId::ANNOUNCEMENT.is_announcement());
        assert!(!ProducerId(7).is_announcement());
        assert_eq!(ProducerId(7).to_string(), "7");
    }

    #[test]
    fn framed_size_overflow() {
        assert_eq!(framed_size(1).unwrap(), 9);
        assert_eq!(
            framed_size(usize::MAX).unwrap_err().kind(),
            ErrorKind::InvalidSize
        );
    }
}
