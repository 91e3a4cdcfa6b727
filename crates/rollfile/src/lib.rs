//! Size-triggered rotating log files with compressed archival.
//!
//! A [`RotatingWriter`] accepts already formatted log bytes and appends them
//! to an active file at `{prefix}.log`. When a write would push the file past
//! the configured maximum, the active file is renamed to a dated backup and a
//! fresh active file takes its place. [`RotatingWriter::rotate`] forces that
//! rotation and then hands every pending backup to the [`Archiver`], which
//! bundles them into one gzip-compressed tarball and removes the originals.
//!
//! # On-disk Layout
//!
//! ```text
//! logs/
//! ├── app.log                      active file
//! ├── app-2024-03-01_1.log         backup (rotation 1)
//! ├── app-2024-03-01_2.log         backup (rotation 2)
//! └── backup/
//!     └── 2024-03-01_1.tar.gz      archive container
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rollfile::{RotatingWriter, WriterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WriterConfig::new("logs/app").with_max_size(10); // 10 MiB
//! let writer = RotatingWriter::new(config)?;
//!
//! writer.write(b"service started\n")?;
//!
//! // Rotate and archive, e.g. from a nightly supervisor job
//! let summary = writer.rotate()?;
//! println!("archived {} files into {}", summary.entries.len(), summary.container.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

mod archive;
mod clock;
mod config;
mod error;
mod naming;
mod stats;
mod writer;

// tracing-subscriber integration
#[cfg(feature = "subscriber")]
mod make_writer;

pub use archive::{ArchiveSummary, Archiver};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WriterConfig;
pub use error::{ArchiveError, Error};
#[cfg(feature = "subscriber")]
pub use make_writer::SharedWriter;
pub use stats::WriterStats;
pub use writer::RotatingWriter;

/// Result type for writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Suffix of the active file and of every backup eligible for archival.
pub const LOG_SUFFIX: &str = ".log";

/// Subdirectory, relative to the active file, holding archive containers.
pub const ARCHIVE_DIR: &str = "backup";

/// Suffix of archive containers.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// `chrono` format of the date embedded in backup and container names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum file size, in size units, used when none is configured.
pub const DEFAULT_MAX_SIZE: u64 = 100;

/// Default size unit: one mebibyte.
pub const MEGABYTE: u64 = 1024 * 1024;
