//! Error types for writer and archive operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing, rotating or closing a log file.
#[derive(Debug, Error)]
pub enum Error {
    /// A single write is larger than the maximum file size.
    ///
    /// Such a payload would not fit even in a freshly rotated file, so it is
    /// rejected before any I/O happens.
    #[error("write length {len} exceeds maximum file size {max}")]
    WriteTooLarge {
        /// Length of the rejected payload
        len: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// Invalid writer configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The log directory could not be created.
    #[error("can't make directories for new logfile {}: {source}", path.display())]
    CreateDir {
        /// Directory that was being created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The active file could not be inspected.
    #[error("error getting log file info {}: {source}", path.display())]
    Stat {
        /// Active file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The active file could not be moved aside to its backup name.
    #[error("can't rename log file {} to {}: {source}", from.display(), to.display())]
    Rename {
        /// Active file path
        from: PathBuf,
        /// Backup path
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A new active file could not be created.
    #[error("can't open new logfile {}: {source}", path.display())]
    Open {
        /// Active file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing to the active file failed.
    ///
    /// `written` bytes of the payload reached the file before the failure
    /// and are counted in its size.
    #[error("write to {} failed after {written} bytes: {source}", path.display())]
    Write {
        /// Active file path
        path: PathBuf,
        /// Bytes of the payload that were written before the failure
        written: usize,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Flushing the active file to disk failed.
    #[error("sync of {} failed: {source}", path.display())]
    Sync {
        /// Active file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Archiving rotated backups failed.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Errors raised while bundling backups into an archive container.
///
/// Failures before the container is published leave every source file in
/// place. A [`ArchiveError::RemoveSource`] failure happens after publishing,
/// so the container is complete and only the remaining sources linger.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The log directory could not be listed.
    #[error("failed to list {}: {source}", path.display())]
    ListDir {
        /// Directory being scanned
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The archive subdirectory could not be created.
    #[error("failed to create archive directory {}: {source}", path.display())]
    CreateDir {
        /// Archive directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The container file could not be created.
    #[error("failed to create archive {}: {source}", path.display())]
    CreateContainer {
        /// Container path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A backup file could not be opened for reading.
    #[error("failed to open log file {}: {source}", path.display())]
    OpenEntry {
        /// Backup file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Copying a backup file into the container failed.
    #[error("failed to copy {} into archive: {source}", path.display())]
    AppendEntry {
        /// Backup file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Finishing, syncing or renaming the container into place failed.
    #[error("failed to publish archive {}: {source}", path.display())]
    Publish {
        /// Final container path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An archived backup could not be removed.
    #[error("failed to remove archived file {}: {source}", path.display())]
    RemoveSource {
        /// Backup file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Write { source, .. } => source,
            err @ Error::WriteTooLarge { .. } => Self::new(io::ErrorKind::InvalidInput, err),
            err => Self::other(err),
        }
    }
}
