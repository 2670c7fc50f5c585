//! # Yamal Core
//!
//! A persistent, multi-process, lock-free append log over a memory-mapped
//! file, with producer, topic and time framing on top.
//!
//! This crate provides:
//! - [`Yamal`]: reserve, commit, read, traverse and remove records
//! - A background thread that preallocates pages and flushes them
//! - [`framing`]: producer, topic and timestamp headers over raw records
//!
//! ## Design Principles
//!
//! - The file is an arena; every link is a 64-bit offset into it
//! - Writers coordinate only through compare-and-swap on the linked list
//! - Once committed, a record's position in the list never changes
//! - Removal unlinks a record but never erases its bytes
//! - Read-only handles never write to the file
//!
//! ## Example
//!
//! ```rust
//! use yamal_core::framing::{producer, time, ProducerId, TopicId};
//! use yamal_core::{Config, Yamal};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = Config::new().page_size(64 * 1024).prealloc_size(0).max_pages(16);
//! let log = Yamal::open(dir.path().join("events.ytp"), config).unwrap();
//!
//! producer::announce(&log, b"feed-a").unwrap();
//!
//! let mut reservation = time::reserve(&log, 4).unwrap();
//! reservation.copy_from_slice(b"ABCD");
//! time::commit(&log, ProducerId(1), TopicId(2), 1000, reservation).unwrap();
//!
//! for entry in log.records(log.begin()) {
//!     let (_, record) = entry.unwrap();
//!     let framed = time::parse(record).unwrap();
//!     if framed.producer.is_announcement() {
//!         assert_eq!(framed.data, b"feed-a");
//!     } else {
//!         assert_eq!(framed.timestamp, Some(1000));
//!         assert_eq!(framed.data, b"ABCD");
//!     }
//! }
//! log.close().unwrap();
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod framing;
mod layout;
mod maintenance;
mod yamal;

pub use config::{Config, MIN_PAGE_SIZE};
pub use error::{ErrorKind, YamalError, YamalResult};
pub use layout::{node_size, ByteOrder, HEADER_SIZE, NODE_HEADER_SIZE, SIGNATURE};
pub use yamal::{Iter, Record, Records, Reservation, Yamal};
pub use yamal_storage::StorageError;
