//! Shared-writer behaviour under concurrent writers and rotations.

#![allow(clippy::unwrap_used)]

use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rollfile::{RotatingWriter, WriterConfig};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const LINES_PER_THREAD: usize = 250;

fn byte_writer(dir: &Path, max: u64) -> RotatingWriter {
    let config = WriterConfig::new(dir.join("app"))
        .with_max_size(max)
        .with_size_unit(1);
    RotatingWriter::new(config).unwrap()
}

/// Every byte the writer produced: live files plus archived entries.
fn collect_output(dir: &Path) -> Vec<u8> {
    let mut out = Vec::new();

    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "log") {
            out.extend(fs::read(&path).unwrap());
        }
    }

    let archive_dir = dir.join("backup");
    if archive_dir.exists() {
        for entry in fs::read_dir(&archive_dir).unwrap() {
            let path = entry.unwrap().path();
            let mut archive = tar::Archive::new(GzDecoder::new(File::open(&path).unwrap()));
            for member in archive.entries().unwrap() {
                member.unwrap().read_to_end(&mut out).unwrap();
            }
        }
    }

    out
}

#[test]
fn test_concurrent_writes_are_never_interleaved() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(byte_writer(dir.path(), 2048));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                let mut total = 0;
                for i in 0..LINES_PER_THREAD {
                    let line = format!("thread-{t} line-{i:04} {}\n", "x".repeat(i % 40));
                    total += writer.write(line.as_bytes()).unwrap();
                }
                total
            })
        })
        .collect();

    let rotator = {
        let writer = Arc::clone(&writer);
        thread::spawn(move || {
            for _ in 0..5 {
                writer.rotate().unwrap();
                thread::yield_now();
            }
        })
    };

    let expected: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    rotator.join().unwrap();
    writer.close().unwrap();

    let output = collect_output(dir.path());
    assert_eq!(output.len(), expected);

    let text = String::from_utf8(output).unwrap();
    let mut seen = vec![0usize; THREADS];
    for line in text.lines() {
        let mut parts = line.split(' ');
        let thread = parts.next().unwrap().strip_prefix("thread-").unwrap();
        let index = parts.next().unwrap().strip_prefix("line-").unwrap();
        let padding = parts.next().unwrap();

        let thread: usize = thread.parse().unwrap();
        let index: usize = index.parse().unwrap();
        assert_eq!(padding.len(), index % 40, "corrupted line: {line:?}");
        seen[thread] += 1;
    }
    assert_eq!(seen, vec![LINES_PER_THREAD; THREADS]);

    let stats = writer.stats();
    assert_eq!(stats.writes, (THREADS * LINES_PER_THREAD) as u64);
    assert_eq!(stats.archives, 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// No file ever exceeds the limit and no byte is lost or duplicated.
    #[test]
    fn size_accounting_holds(
        max in 16u64..256,
        sizes in prop::collection::vec(1usize..=256, 1..60),
    ) {
        let dir = TempDir::new().unwrap();
        let writer = byte_writer(dir.path(), max);

        let mut accepted = 0usize;
        for size in sizes {
            match writer.write(&vec![b'.'; size]) {
                Ok(n) => accepted += n,
                Err(rollfile::Error::WriteTooLarge { len, .. }) => {
                    prop_assert!(len > max);
                }
                Err(err) => return Err(TestCaseError::fail(err.to_string())),
            }
        }

        let mut on_disk = 0u64;
        for entry in fs::read_dir(dir.path()).unwrap() {
            let len = entry.unwrap().metadata().unwrap().len();
            prop_assert!(len <= max);
            on_disk += len;
        }

        prop_assert_eq!(on_disk, accepted as u64);
        prop_assert_eq!(writer.stats().bytes_written, accepted as u64);
        if accepted > 0 {
            prop_assert_eq!(writer.current_size(), fs::metadata(writer.filename()).unwrap().len());
        }
    }
}
