//! Size-triggered rotating writer
//!
//! All state transitions (opening, writing, rotating, archiving, closing)
//! happen under one mutex per writer, so concurrent callers are fully
//! linearized. Rotation and archival run synchronously on the calling thread.
#![allow(clippy::significant_drop_tightening)] // the state lock spans each whole operation

use crate::archive::{ArchiveSummary, Archiver};
use crate::clock::{Clock, SystemClock};
use crate::config::WriterConfig;
use crate::naming;
use crate::stats::{WriterMetrics, WriterStats};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mode of an active file created without a predecessor.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o600;

/// Mutable state, only touched with the writer lock held.
#[derive(Debug, Default)]
struct WriterState {
    /// Active file handle, opened lazily
    file: Option<File>,
    /// Bytes in the active file
    size: u64,
    /// Last counter used in a backup name
    rotations: u64,
    /// Last counter used in a container name
    compressions: u64,
}

/// Log file writer that rotates on size and archives rotated backups.
///
/// The writer is shared by reference: every operation takes `&self` and
/// serializes on an internal lock. It also implements [`std::io::Write`]
/// (for both `RotatingWriter` and `&RotatingWriter`) so it can be handed to
/// any byte-producing logging front end.
///
/// To back a `tracing-subscriber` `fmt` layer, convert it into a
/// `SharedWriter` (`SharedWriter::from(writer)`). Passing an
/// `Arc<RotatingWriter>` instead lets this crate's own events reach the
/// writer while it holds its lock, which deadlocks on rotation.
#[derive(Debug)]
pub struct RotatingWriter {
    config: WriterConfig,
    stem: OsString,
    filename: PathBuf,
    max: u64,
    clock: Box<dyn Clock>,
    archiver: Archiver,
    state: Mutex<WriterState>,
    metrics: WriterMetrics,
}

impl RotatingWriter {
    /// Create a writer using the system clock.
    ///
    /// No file is touched until the first write or rotation.
    pub fn new(config: WriterConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Create a writer that dates backups and containers with `clock`.
    pub fn with_clock(config: WriterConfig, clock: impl Clock + 'static) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        let prefix = config.resolved_prefix();
        let Some(stem) = prefix.file_name().map(ToOwned::to_owned) else {
            return Err(Error::Config(format!("prefix {} has no file name", prefix.display())));
        };

        let filename = config.filename();
        let archiver = Archiver::new(&filename);

        Ok(Self {
            max: config.max_bytes(),
            config,
            stem,
            filename,
            clock: Box::new(clock),
            archiver,
            state: Mutex::new(WriterState::default()),
            metrics: WriterMetrics::default(),
        })
    }

    /// Writer configuration
    pub const fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Path of the active file
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Directory holding the active file and its backups
    pub fn directory(&self) -> &Path {
        self.archiver.directory()
    }

    /// Directory receiving archive containers
    pub fn archive_dir(&self) -> &Path {
        self.archiver.archive_dir()
    }

    /// Maximum active file size in bytes
    pub const fn max_bytes(&self) -> u64 {
        self.max
    }

    /// Bytes in the active file, or 0 when none is open.
    pub fn current_size(&self) -> u64 {
        let state = self.state.lock();
        if state.file.is_some() { state.size } else { 0 }
    }

    /// Activity counters
    pub fn stats(&self) -> WriterStats {
        self.metrics.snapshot()
    }

    /// Append `data` to the active file, rotating first if it would not fit.
    ///
    /// Payloads larger than the maximum file size are rejected before any
    /// I/O. The payload is never split across files. If the file accepts only
    /// part of it, the returned [`Error::Write`] carries the written length.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let len = data.len() as u64;
        if len > self.max {
            return Err(Error::WriteTooLarge { len, max: self.max });
        }

        let mut state = self.state.lock();

        let mut file = match state.file.take() {
            Some(file) => file,
            None => self.open_existing_or_new(&mut state, len)?,
        };

        if state.size + len > self.max {
            drop(file);
            file = self.open_new(&mut state)?;
        }

        let result = write_counted(&mut file, data);
        state.file = Some(file);

        match result {
            Ok(()) => {
                state.size += len;
                self.metrics.record_write(data.len());
                Ok(data.len())
            }
            Err((written, source)) => {
                state.size += written as u64;
                self.metrics.record_partial_write(written);
                Err(Error::Write {
                    path: self.filename.clone(),
                    written,
                    source,
                })
            }
        }
    }

    /// Rotate the active file unconditionally, then archive every backup.
    ///
    /// The current active file (even an empty one) becomes a backup, a fresh
    /// active file is opened, and all backups in the directory are moved into
    /// a new container under [`archive_dir`](Self::archive_dir).
    pub fn rotate(&self) -> Result<ArchiveSummary> {
        let mut state = self.state.lock();

        state.file = None;
        let file = self.open_new(&mut state)?;
        state.file = Some(file);

        let date = self.date_stamp();
        let container = naming::next_unused(&mut state.compressions, |n| {
            self.archiver
                .archive_dir()
                .join(naming::container_name(&date, n))
        });
        let name = container
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let summary = self.archiver.archive(&name)?;
        self.metrics.record_archive(summary.entries.len());

        Ok(summary)
    }

    /// Flush the active file to disk.
    pub fn sync(&self) -> Result<()> {
        let state = self.state.lock();
        if let Some(file) = &state.file {
            self.sync_file(file)?;
        }
        Ok(())
    }

    /// Sync and release the active file. Closing a closed writer is a no-op.
    ///
    /// The next write reopens the active file in append mode.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.file.take() {
            Some(file) => self.sync_file(&file),
            None => Ok(()),
        }
    }

    fn sync_file(&self, file: &File) -> Result<()> {
        file.sync_all().map_err(|source| Error::Sync {
            path: self.filename.clone(),
            source,
        })
    }

    fn date_stamp(&self) -> String {
        naming::date_stamp(self.clock.as_ref(), self.config.local_time)
    }

    /// Adopt an existing active file when the pending write still fits,
    /// otherwise rotate it away.
    fn open_existing_or_new(&self, state: &mut WriterState, len: u64) -> Result<File> {
        let info = match fs::metadata(&self.filename) {
            Ok(info) => info,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return self.open_new(state),
            Err(source) => {
                return Err(Error::Stat {
                    path: self.filename.clone(),
                    source,
                });
            }
        };

        if info.len() + len >= self.max {
            return self.open_new(state);
        }

        match OpenOptions::new().append(true).open(&self.filename) {
            Ok(file) => {
                state.size = info.len();
                Ok(file)
            }
            Err(err) => {
                warn!(
                    "Failed to reopen {} for append, starting a new file: {err}",
                    self.filename.display()
                );
                self.open_new(state)
            }
        }
    }

    /// Move any existing active file to a backup name and create an empty
    /// active file in its place.
    fn open_new(&self, state: &mut WriterState) -> Result<File> {
        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let permissions = match fs::metadata(&self.filename) {
            Ok(info) => {
                let date = self.date_stamp();
                let backup = naming::next_unused(&mut state.rotations, |n| {
                    naming::backup_name(&self.filename, &self.stem, &date, n)
                });

                fs::rename(&self.filename, &backup).map_err(|source| Error::Rename {
                    from: self.filename.clone(),
                    to: backup.clone(),
                    source,
                })?;

                self.metrics.record_rotation();
                debug!(
                    "Rotated {} to {}",
                    self.filename.display(),
                    backup.display()
                );
                Some(info.permissions())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(Error::Stat {
                    path: self.filename.clone(),
                    source,
                });
            }
        };

        let file = create_truncated(&self.filename, permissions.as_ref()).map_err(|source| {
            Error::Open {
                path: self.filename.clone(),
                source,
            }
        })?;

        state.size = 0;
        Ok(file)
    }
}

fn create_truncated(path: &Path, permissions: Option<&Permissions>) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(permissions.map_or(NEW_FILE_MODE, PermissionsExt::mode));
    }
    #[cfg(not(unix))]
    let _ = permissions;

    options.open(path)
}

/// Write all of `data`, reporting how much landed on disk if it fails midway.
fn write_counted<W: Write>(
    out: &mut W,
    data: &[u8],
) -> std::result::Result<(), (usize, io::Error)> {
    let mut written = 0;
    while written < data.len() {
        match out.write(&data[written..]) {
            Ok(0) => return Err((written, io::Error::from(io::ErrorKind::WriteZero))),
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err((written, err)),
        }
    }
    Ok(())
}

/// Maps a writer result onto `io::Write` semantics, where an error means
/// nothing was written. A partially applied payload reports its length.
fn io_result(result: Result<usize>) -> io::Result<usize> {
    match result {
        Ok(n) | Err(Error::Write { written: n @ 1.., .. }) => Ok(n),
        Err(err) => Err(err.into()),
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_result(RotatingWriter::write(*self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}
