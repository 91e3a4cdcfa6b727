//! Archival of rotated backups into a compressed container
//!
//! Backups are bundled into a gzip-compressed tarball under the archive
//! subdirectory. The container is assembled under a `.partial` name and only
//! renamed into place once every entry has been copied, so a published
//! container is always complete. Source files are removed after publishing.

use crate::error::ArchiveError;
use crate::{ARCHIVE_DIR, LOG_SUFFIX};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const PARTIAL_SUFFIX: &str = ".partial";

/// Outcome of a successful archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the published container
    pub container: PathBuf,
    /// Entry names written to the container, in archive order
    pub entries: Vec<String>,
}

/// Bundles the backups that sit next to an active log file.
#[derive(Debug, Clone)]
pub struct Archiver {
    directory: PathBuf,
    active_name: OsString,
    archive_dir: PathBuf,
    compression: Compression,
}

impl Archiver {
    /// Create an archiver for the backups of `active`.
    ///
    /// The directory scanned is the one containing `active`; containers go
    /// to its `backup` subdirectory.
    pub fn new(active: impl AsRef<Path>) -> Self {
        let active = active.as_ref();
        let directory = match active.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self {
            archive_dir: directory.join(ARCHIVE_DIR),
            active_name: active.file_name().map(OsStr::to_os_string).unwrap_or_default(),
            directory,
            compression: Compression::default(),
        }
    }

    /// Set the gzip compression level for new containers.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Directory scanned for backups.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Directory receiving containers.
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Backups eligible for archival, sorted by file name.
    ///
    /// A file is eligible when it is a regular file ending in `.log` that is
    /// not the active file. Subdirectories are not descended into.
    pub fn eligible(&self) -> Result<Vec<PathBuf>, ArchiveError> {
        let list_err = |source| ArchiveError::ListDir {
            path: self.directory.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_file() {
                continue;
            }

            let name = entry.file_name();
            if name == self.active_name {
                continue;
            }

            if name.to_string_lossy().ends_with(LOG_SUFFIX) {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Archive every eligible backup into `{archive_dir}/{file_name}`.
    ///
    /// An existing file at the container path is replaced. On any failure
    /// before the container is published, the partial container is removed
    /// and all sources are left untouched.
    pub fn archive(&self, file_name: &str) -> Result<ArchiveSummary, ArchiveError> {
        let sources = self.eligible()?;

        fs::create_dir_all(&self.archive_dir).map_err(|source| ArchiveError::CreateDir {
            path: self.archive_dir.clone(),
            source,
        })?;

        let container = self.archive_dir.join(file_name);
        let partial = partial_path(&container);

        let entries = match self.write_container(&partial, &sources) {
            Ok(entries) => entries,
            Err(err) => {
                let _ = fs::remove_file(&partial);
                return Err(err);
            }
        };

        if let Err(source) = fs::rename(&partial, &container) {
            let _ = fs::remove_file(&partial);
            return Err(ArchiveError::Publish {
                path: container,
                source,
            });
        }

        debug!(
            "Published archive {} with {} entries",
            container.display(),
            entries.len()
        );

        for source_path in &sources {
            fs::remove_file(source_path).map_err(|source| ArchiveError::RemoveSource {
                path: source_path.clone(),
                source,
            })?;
            trace!("Removed archived file {}", source_path.display());
        }

        Ok(ArchiveSummary { container, entries })
    }

    fn write_container(
        &self,
        partial: &Path,
        sources: &[PathBuf],
    ) -> Result<Vec<String>, ArchiveError> {
        let file = File::create(partial).map_err(|source| ArchiveError::CreateContainer {
            path: partial.to_path_buf(),
            source,
        })?;

        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);
        let mut builder = tar::Builder::new(encoder);
        let mut entries = Vec::with_capacity(sources.len());

        for source_path in sources {
            let Some(name) = source_path.file_name() else {
                continue;
            };

            let mut source = File::open(source_path).map_err(|source| ArchiveError::OpenEntry {
                path: source_path.clone(),
                source,
            })?;

            builder
                .append_file(name, &mut source)
                .map_err(|source| ArchiveError::AppendEntry {
                    path: source_path.clone(),
                    source,
                })?;

            entries.push(name.to_string_lossy().into_owned());
        }

        let publish_err = |source| ArchiveError::Publish {
            path: partial.to_path_buf(),
            source,
        };

        let encoder = builder.into_inner().map_err(publish_err)?;
        let writer = encoder.finish().map_err(publish_err)?;
        let file = writer
            .into_inner()
            .map_err(|err| publish_err(err.into_error()))?;
        file.sync_all().map_err(publish_err)?;

        Ok(entries)
    }
}

fn partial_path(container: &Path) -> PathBuf {
    let mut name = container.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
