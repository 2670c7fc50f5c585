//! Benchmark utilities.

use tempfile::TempDir;
use yamal_core::{node_size, Config, Yamal};

/// Page size used by every benchmark log.
pub const PAGE_SIZE: u64 = 8 * 1024 * 1024;

/// Generate deterministic data of the specified size.
pub fn pattern_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Open a fresh log large enough for `records` payloads of `size` bytes.
///
/// The directory must outlive the log.
pub fn fresh_log(records: u64, size: usize) -> (TempDir, Yamal) {
    let dir = tempfile::tempdir().expect("temp dir");
    let per_page = (PAGE_SIZE / node_size(size as u64)).max(1);
    let pages = records / per_page + 2;
    let config = Config::new()
        .page_size(PAGE_SIZE)
        .max_pages(pages as usize + 1);
    let log = Yamal::open(dir.path().join("bench.ytp"), config).expect("open log");
    (dir, log)
}

/// Append one raw record.
pub fn append(log: &Yamal, data: &[u8]) {
    let mut reservation = log.reserve(data.len()).expect("reserve");
    reservation.copy_from_slice(data);
    log.commit(reservation).expect("commit");
}
