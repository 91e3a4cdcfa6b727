//! Writer activity counters
//!
//! Counters are atomics so that [`RotatingWriter::stats`](crate::RotatingWriter::stats)
//! can be read without waiting for a write or archive holding the writer lock.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a writer's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Successful write calls
    pub writes: u64,
    /// Bytes written across all files
    pub bytes_written: u64,
    /// Backups produced by rotation
    pub rotations: u64,
    /// Containers published
    pub archives: u64,
    /// Backups moved into containers
    pub archived_files: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WriterMetrics {
    writes: AtomicU64,
    bytes_written: AtomicU64,
    rotations: AtomicU64,
    archives: AtomicU64,
    archived_files: AtomicU64,
}

impl WriterMetrics {
    #[inline]
    pub(crate) fn record_write(&self, bytes: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_partial_write(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_archive(&self, files: usize) {
        self.archives.fetch_add(1, Ordering::Relaxed);
        self.archived_files.fetch_add(files as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WriterStats {
        WriterStats {
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            archives: self.archives.load(Ordering::Relaxed),
            archived_files: self.archived_files.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accumulates() {
        let metrics = WriterMetrics::default();
        metrics.record_write(200);
        metrics.record_write(50);
        metrics.record_partial_write(10);
        metrics.record_rotation();
        metrics.record_archive(3);

        assert_eq!(
            metrics.snapshot(),
            WriterStats {
                writes: 2,
                bytes_written: 260,
                rotations: 1,
                archives: 1,
                archived_files: 3,
            }
        );
    }
}
