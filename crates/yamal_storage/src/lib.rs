//! # Yamal Storage
//!
//! Paged, lazily memory-mapped file storage underneath the yamal log.
//!
//! This crate is the lowest layer of yamal. It maps fixed-size pages of a
//! backing file on first touch and hands out word-aligned atomics and byte
//! slices inside those pages. It does **not** interpret the bytes it maps;
//! record layout, linking and framing belong to `yamal_core`.
//!
//! ## Design Principles
//!
//! - Pages are mapped lazily and stay mapped until the manager is dropped
//! - A writable file is grown on demand, never truncated
//! - A read-only file is never written; touching a page past its end fails
//! - Resolving an already mapped page takes no lock
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::Ordering;
//! use yamal_storage::{LogFile, PageGeometry, PageManager};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = LogFile::open(&dir.path().join("data.ytp"), false, true).unwrap();
//! let pages = PageManager::new(file, PageGeometry::new(64 * 1024, 16)).unwrap();
//!
//! let word = &pages.words(0, 1).unwrap()[0];
//! word.store(1, Ordering::Release);
//! assert!(pages.is_mapped(0));
//! ```

#![warn(missing_docs)]

mod error;
mod file;
mod pages;

pub use error::{StorageError, StorageResult};
pub use file::LogFile;
pub use pages::{PageGeometry, PageManager, WORD_SIZE};
