//! Configuration for a rotating writer

use crate::{DEFAULT_MAX_SIZE, LOG_SUFFIX, MEGABYTE};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn default_size_unit() -> u64 {
    MEGABYTE
}

/// Configuration for a [`RotatingWriter`](crate::RotatingWriter).
///
/// Supplied once at construction; the writer never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Base path of the log files. The active file is `{prefix}.log` and
    /// backups are named after the prefix's last component.
    ///
    /// An empty prefix falls back to `{temp_dir}/{executable}-rollfile`.
    pub prefix: PathBuf,

    /// Maximum size of the active file, in size units (MiB by default).
    /// Zero selects [`DEFAULT_MAX_SIZE`].
    #[serde(alias = "maxsize")]
    pub max_size: u64,

    /// Use local time instead of UTC for dates in generated names.
    #[serde(alias = "localtime")]
    pub local_time: bool,

    /// Bytes per size unit. Only meant to be lowered by tests.
    #[serde(skip, default = "default_size_unit")]
    pub size_unit: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            prefix: PathBuf::new(),
            max_size: DEFAULT_MAX_SIZE,
            local_time: false,
            size_unit: MEGABYTE,
        }
    }
}

impl WriterConfig {
    /// Create a configuration for the given prefix with default limits.
    pub fn new<P: AsRef<Path>>(prefix: P) -> Self {
        Self {
            prefix: prefix.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the maximum file size in size units.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Use local time for generated names.
    #[must_use]
    pub const fn with_local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    /// Set the number of bytes per size unit.
    #[must_use]
    pub const fn with_size_unit(mut self, size_unit: u64) -> Self {
        self.size_unit = size_unit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.size_unit == 0 {
            return Err("size_unit must be greater than 0".to_string());
        }

        if self.effective_max_size().checked_mul(self.size_unit).is_none() {
            return Err(format!(
                "max_size {} overflows with size_unit {}",
                self.max_size, self.size_unit
            ));
        }

        Ok(())
    }

    /// Maximum size of the active file in bytes.
    pub const fn max_bytes(&self) -> u64 {
        self.effective_max_size().saturating_mul(self.size_unit)
    }

    const fn effective_max_size(&self) -> u64 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }

    /// Prefix with the empty-prefix fallback applied.
    pub fn resolved_prefix(&self) -> PathBuf {
        if self.prefix.as_os_str().is_empty() {
            default_prefix()
        } else {
            self.prefix.clone()
        }
    }

    /// Path of the active log file: `{prefix}.log`.
    pub fn filename(&self) -> PathBuf {
        let mut name = OsString::from(self.resolved_prefix());
        name.push(LOG_SUFFIX);
        PathBuf::from(name)
    }
}

fn default_prefix() -> PathBuf {
    let program = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    std::env::temp_dir().join(format!("{program}-rollfile"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WriterConfig::new("logs/app");
        assert_eq!(config.max_bytes(), 100 * 1024 * 1024);
        assert!(!config.local_time);
        assert_eq!(config.filename(), PathBuf::from("logs/app.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_size_uses_default() {
        let config = WriterConfig::new("app").with_max_size(0);
        assert_eq!(config.max_bytes(), DEFAULT_MAX_SIZE * MEGABYTE);
    }

    #[test]
    fn test_size_unit_scales_threshold() {
        let config = WriterConfig::new("app")
            .with_max_size(1024)
            .with_size_unit(1);
        assert_eq!(config.max_bytes(), 1024);
    }

    #[test]
    fn test_validate_rejects_zero_unit() {
        let config = WriterConfig::new("app").with_size_unit(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflow() {
        let config = WriterConfig::new("app").with_max_size(u64::MAX);
        assert!(config.validate().unwrap_err().contains("overflows"));
    }

    #[test]
    fn test_empty_prefix_falls_back_to_temp_dir() {
        let config = WriterConfig::default();
        let filename = config.filename();
        assert!(filename.starts_with(std::env::temp_dir()));
        assert!(filename.to_string_lossy().ends_with("-rollfile.log"));
    }

    #[test]
    fn test_deserialize_short_keys() {
        let config: WriterConfig =
            serde_json::from_str(r#"{"prefix": "logs/app", "maxsize": 1, "localtime": true}"#)
                .unwrap();
        assert_eq!(config.prefix, PathBuf::from("logs/app"));
        assert_eq!(config.max_bytes(), MEGABYTE);
        assert!(config.local_time);
        assert_eq!(config.size_unit, MEGABYTE);
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let config: WriterConfig = serde_json::from_str(r#"{"prefix": "app"}"#).unwrap();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert!(!config.local_time);
    }
}
