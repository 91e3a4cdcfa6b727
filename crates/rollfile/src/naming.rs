//! File naming for backups and archive containers

use crate::{ARCHIVE_SUFFIX, Clock, DATE_FORMAT};
use chrono::Local;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Date stamp for generated names, in local time or UTC.
pub(crate) fn date_stamp(clock: &dyn Clock, local_time: bool) -> String {
    let now = clock.now();
    if local_time {
        now.with_timezone(&Local).format(DATE_FORMAT).to_string()
    } else {
        now.format(DATE_FORMAT).to_string()
    }
}

/// Backup path for `active`: `{stem}-{date}_{counter}{ext}` in the same directory.
pub(crate) fn backup_name(active: &Path, stem: &OsStr, date: &str, counter: u64) -> PathBuf {
    let mut name = OsString::from(stem);
    name.push(format!("-{date}_{counter}"));
    if let Some(ext) = active.extension() {
        name.push(".");
        name.push(ext);
    }

    match active.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Container file name: `{date}_{counter}.tar.gz`.
pub(crate) fn container_name(date: &str, counter: u64) -> String {
    format!("{date}_{counter}{ARCHIVE_SUFFIX}")
}

/// Advances `counter` until `candidate` yields a path that does not exist yet.
///
/// The counter always moves at least once, so a name is never handed out
/// twice by the same counter.
pub(crate) fn next_unused(counter: &mut u64, candidate: impl Fn(u64) -> PathBuf) -> PathBuf {
    loop {
        *counter += 1;
        let path = candidate(*counter);
        if std::fs::symlink_metadata(&path).is_err() {
            return path;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap())
    }

    #[test]
    fn test_date_stamp_utc() {
        assert_eq!(date_stamp(&clock(), false), "2024-03-01");
    }

    #[test]
    fn test_date_stamp_local() {
        let expected = clock()
            .now()
            .with_timezone(&Local)
            .format(DATE_FORMAT)
            .to_string();
        assert_eq!(date_stamp(&clock(), true), expected);
    }

    #[test]
    fn test_backup_name_keeps_directory_and_extension() {
        let path = backup_name(
            Path::new("/var/log/svc/app.log"),
            OsStr::new("app"),
            "2024-03-01",
            3,
        );
        assert_eq!(path, PathBuf::from("/var/log/svc/app-2024-03-01_3.log"));
    }

    #[test]
    fn test_backup_name_relative() {
        let path = backup_name(Path::new("app.log"), OsStr::new("app"), "2024-03-01", 1);
        assert_eq!(path, PathBuf::from("app-2024-03-01_1.log"));
    }

    #[test]
    fn test_container_name() {
        assert_eq!(container_name("2024-03-01", 7), "2024-03-01_7.tar.gz");
    }

    #[test]
    fn test_next_unused_skips_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f_1"), b"").unwrap();
        std::fs::write(dir.path().join("f_2"), b"").unwrap();

        let mut counter = 0;
        let path = next_unused(&mut counter, |n| dir.path().join(format!("f_{n}")));
        assert_eq!(counter, 3);
        assert_eq!(path, dir.path().join("f_3"));

        let path = next_unused(&mut counter, |n| dir.path().join(format!("f_{n}")));
        assert_eq!(counter, 4);
        assert_eq!(path, dir.path().join("f_4"));
    }
}
