//! On-disk layout of the log.
//!
//! ```text
//! offset 0:  | size (8) | next (8) | prev (8) | seqno (8) | signature (8) |
//!              frontier   head       tail hint  always 0    "YAMAL001"
//! record:    | size (8) | next (8) | prev (8) | seqno (8) | payload, word padded |
//! ```
//!
//! The header record is laid out as an ordinary node, so traversal and commit
//! treat offset 0 as the list's sentinel. Structural fields use the configured
//! [`ByteOrder`]; a link value of zero means "none". Offsets are word aligned,
//! which leaves the low bit of a link free for the removal mark.

use yamal_storage::WORD_SIZE;

/// Offset of the byte length (write frontier in the header).
pub(crate) const SIZE_FIELD: usize = 0;
/// Offset of the forward link (head in the header).
pub(crate) const NEXT_FIELD: usize = 1;
/// Offset of the backward link (tail hint in the header).
pub(crate) const PREV_FIELD: usize = 2;
/// Offset of the sequence number.
pub(crate) const SEQNO_FIELD: usize = 3;

/// Mark on a forward link claimed by a removal. Neither commits nor other
/// removals can change a marked link. A removed record keeps its mark; a
/// removal that loses its race clears it again. Readers ignore the bit.
pub(crate) const MARKED: u64 = 1;

/// Number of 64-bit words in a node header.
pub(crate) const NODE_WORDS: usize = 4;

/// Size of a record header in bytes.
pub const NODE_HEADER_SIZE: u64 = NODE_WORDS as u64 * WORD_SIZE;

/// Signature stored right after the header record's node fields.
pub const SIGNATURE: [u8; 8] = *b"YAMAL001";

/// Offset of the signature word.
pub(crate) const SIGNATURE_OFFSET: u64 = NODE_HEADER_SIZE;

/// Size of the header record; the write frontier of an empty log.
pub const HEADER_SIZE: u64 = NODE_HEADER_SIZE + WORD_SIZE;

/// Rounds `n` up to the next word boundary.
#[must_use]
pub const fn word_ceil(n: u64) -> u64 {
    (n + WORD_SIZE - 1) & !(WORD_SIZE - 1)
}

/// Bytes a record with a `payload`-byte payload occupies in the file.
#[must_use]
pub const fn node_size(payload: u64) -> u64 {
    word_ceil(NODE_HEADER_SIZE + payload)
}

/// Byte order of the record's structural fields.
///
/// Framing headers are always big-endian and do not depend on this choice.
/// All handles opening one file must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little-endian fields (the reference layout).
    #[default]
    Little,
    /// Big-endian fields.
    Big,
}

impl ByteOrder {
    /// Converts a host value to its stored representation.
    #[must_use]
    pub const fn encode(self, value: u64) -> u64 {
        match self {
            Self::Little => value.to_le(),
            Self::Big => value.to_be(),
        }
    }

    /// Converts a stored representation back to a host value.
    #[must_use]
    pub const fn decode(self, stored: u64) -> u64 {
        match self {
            Self::Little => u64::from_le(stored),
            Self::Big => u64::from_be(stored),
        }
    }
}
