//! Inspect command implementation.

use super::LogOptions;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use yamal_core::framing::producer;
use yamal_core::{Yamal, HEADER_SIZE};

/// Log inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Log path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Write frontier in bytes.
    pub frontier: u64,
    /// Configured capacity in bytes.
    pub capacity: u64,
    /// Page size in bytes.
    pub page_size: u64,
    /// Number of linked records.
    pub records: usize,
    /// Number of announcement records.
    pub announcements: usize,
    /// Distinct producers among non-announcement records.
    pub producers: usize,
    /// Records too short to carry a producer field.
    pub unframed: usize,
    /// Names carried by announcements, in log order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub announced: Vec<String>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    options: &LogOptions,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No log found at {:?}", path).into());
    }

    let log = options.open(path, true)?;
    let result = inspect(&log, path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(log: &Yamal, path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut result = InspectResult {
        path: path.display().to_string(),
        file_size: std::fs::metadata(path)?.len(),
        frontier: log.reserved_size()?,
        capacity: log.config().capacity(),
        page_size: log.config().page_size,
        records: 0,
        announcements: 0,
        producers: 0,
        unframed: 0,
        announced: Vec::new(),
    };

    let mut producers = BTreeSet::new();
    for entry in log.records(log.begin()) {
        let (_, record) = entry?;
        result.records += 1;
        match producer::parse(record) {
            Ok(framed) if framed.producer.is_announcement() => {
                result.announcements += 1;
                result
                    .announced
                    .push(String::from_utf8_lossy(framed.data).into_owned());
            }
            Ok(framed) => {
                producers.insert(framed.producer);
            }
            Err(_) => result.unframed += 1,
        }
    }
    result.producers = producers.len();

    Ok(result)
}

fn print_text_output(result: &InspectResult) {
    println!("Yamal Log Inspection");
    println!("====================");
    println!();
    println!("Path: {}", result.path);
    println!("Signature: ok");
    println!();
    println!("Storage:");
    println!("  File size: {}", format_size(result.file_size));
    println!("  Frontier:  {}", format_size(result.frontier));
    println!("  Capacity:  {}", format_size(result.capacity));
    println!("  Page size: {}", format_size(result.page_size));
    println!(
        "  Used:      {:.2}%",
        (result.frontier - HEADER_SIZE) as f64 * 100.0 / result.capacity as f64
    );
    println!();
    println!("Records:");
    println!("  Linked:        {}", result.records);
    println!("  Announcements: {}", result.announcements);
    println!("  Producers:     {}", result.producers);
    if result.unframed > 0 {
        println!("  Unframed:      {}", result.unframed);
    }

    if !result.announced.is_empty() {
        println!();
        println!("Announced:");
        for name in &result.announced {
            println!("  {name}");
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::options;
    use yamal_core::framing::{time, ProducerId, TopicId};

    #[test]
    fn counts_records_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inspect.ytp");
        {
            let log = options().open(&path, false).unwrap();
            producer::announce(&log, b"feed").unwrap();
            for producer in [1, 2, 1] {
                let reservation = time::reserve(&log, 3).unwrap();
                time::commit(&log, ProducerId(producer), TopicId(1), 0, reservation).unwrap();
            }
            let mut raw = log.reserve(2).unwrap();
            raw.copy_from_slice(b"xy");
            log.commit(raw).unwrap();
            log.close().unwrap();
        }

        let log = options().open(&path, true).unwrap();
        let result = inspect(&log, &path).unwrap();
        assert_eq!(result.records, 5);
        assert_eq!(result.announcements, 1);
        assert_eq!(result.producers, 2);
        assert_eq!(result.unframed, 1);
        assert_eq!(result.announced, vec!["feed".to_string()]);
        assert_eq!(result.file_size, 64 * 1024);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(8 * 1024 * 1024), "8.0 MB");
    }
}
