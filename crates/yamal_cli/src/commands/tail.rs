//! Tail command implementation.

use super::LogOptions;
use serde::Serialize;
use std::path::Path;
use yamal_core::framing::time;
use yamal_core::Yamal;

const PREVIEW_LEN: usize = 32;

/// A record as printed by `tail`.
#[derive(Debug, Serialize)]
pub struct TailEntry {
    /// Persistable offset; pass to `--from` to resume here.
    pub offset: u64,
    /// Sequence number.
    pub seqno: u64,
    /// Producer id (absent for unframed records).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<u64>,
    /// Topic id (absent for announcements).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<u64>,
    /// Timestamp (absent for announcements).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Payload length in bytes.
    pub len: usize,
    /// Escaped payload prefix.
    pub preview: String,
}

/// Runs the tail command.
pub fn run(
    path: &Path,
    options: &LogOptions,
    limit: Option<usize>,
    from: u64,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = options.open(path, true)?;
    let entries = collect(&log, limit, from)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            for entry in &entries {
                print_entry(entry);
            }
        }
    }

    Ok(())
}

fn collect(
    log: &Yamal,
    limit: Option<usize>,
    from: u64,
) -> Result<Vec<TailEntry>, Box<dyn std::error::Error>> {
    let start = log.seek(from)?;
    let mut entries = Vec::new();

    for entry in log.records(start).take(limit.unwrap_or(usize::MAX)) {
        let (position, record) = entry?;
        let offset = log.tell(position);
        let entry = match time::parse(record) {
            Ok(framed) => TailEntry {
                offset,
                seqno: framed.seqno,
                producer: Some(framed.producer.0),
                topic: framed.topic.map(|topic| topic.0),
                timestamp: framed.timestamp,
                len: framed.data.len(),
                preview: preview(framed.data),
            },
            Err(e) => {
                tracing::debug!(offset, error = %e, "record is not time framed");
                TailEntry {
                    offset,
                    seqno: record.seqno,
                    producer: None,
                    topic: None,
                    timestamp: None,
                    len: record.data.len(),
                    preview: preview(record.data),
                }
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}

fn preview(data: &[u8]) -> String {
    let mut out: String = data
        .iter()
        .take(PREVIEW_LEN)
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect();
    if data.len() > PREVIEW_LEN {
        out.push_str("...");
    }
    out
}

fn print_entry(entry: &TailEntry) {
    let producer = entry
        .producer
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    match (entry.topic, entry.timestamp) {
        (Some(topic), Some(timestamp)) => println!(
            "@{} #{} producer={} topic={} ts={} len={} {}",
            entry.offset, entry.seqno, producer, topic, timestamp, entry.len, entry.preview
        ),
        _ => println!(
            "@{} #{} producer={} len={} {}",
            entry.offset, entry.seqno, producer, entry.len, entry.preview
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::options;
    use yamal_core::framing::{producer, ProducerId, TopicId};

    #[test]
    fn resumes_from_printed_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tail.ytp");
        let log = options().open(&path, false).unwrap();
        producer::announce(&log, b"feed").unwrap();
        for ts in 0..4 {
            let mut reservation = time::reserve(&log, 5).unwrap();
            reservation.copy_from_slice(b"hello");
            time::commit(&log, ProducerId(1), TopicId(7), ts, reservation).unwrap();
        }

        let first = collect(&log, Some(2), 0).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].producer, Some(0));
        assert_eq!(first[0].topic, None);
        assert_eq!(first[0].preview, "feed");
        assert_eq!(first[1].timestamp, Some(0));

        // The offset after the last printed record resumes the listing.
        let next = log.tell(log.next(log.seek(first[1].offset).unwrap()).unwrap());
        let rest = collect(&log, None, next).unwrap();
        let stamps: Vec<_> = rest.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn bad_offset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let log = options().open(&dir.path().join("tail.ytp"), false).unwrap();
        assert!(collect(&log, None, 13).is_err());
    }

    #[test]
    fn preview_escapes_and_truncates() {
        assert_eq!(preview(b"a\nb"), "a\\nb");
        let long = [b'x'; 40];
        assert_eq!(preview(&long), format!("{}...", "x".repeat(32)));
    }
}
