// app/config.rs
//
// Application configuration: loaded from config.toml in the platform
// config directory, merged over built-in defaults, then validated into
// the existing ConfigError taxonomy. Modeled on the validate-and-compile
// shape used for rule sets and, before that, format profiles.

use crate::util::constants;
use crate::util::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Raw TOML configuration as deserialized from `config.toml`. Every field
/// is optional; missing fields fall back to the built-in default in
/// `AppConfig::from_raw`.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub log_upload_dir: Option<PathBuf>,
    pub log_watch_dir: Option<PathBuf>,
    pub max_upload_size_mb: Option<u64>,
    pub supported_extensions: Option<Vec<String>>,
    pub watch_poll_interval_seconds: Option<u64>,
    pub entry_batch_size: Option<usize>,
    pub max_entry_size_bytes: Option<usize>,
    pub log_level: Option<String>,
}

/// Fully resolved, validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_upload_dir: PathBuf,
    pub log_watch_dir: PathBuf,
    pub max_upload_size_mb: u64,
    pub supported_extensions: Vec<String>,
    pub watch_poll_interval_seconds: u64,
    pub entry_batch_size: usize,
    pub max_entry_size_bytes: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_upload_dir: PathBuf::from("./uploads"),
            log_watch_dir: PathBuf::from("./watch"),
            max_upload_size_mb: constants::DEFAULT_MAX_UPLOAD_SIZE_MB,
            supported_extensions: constants::DEFAULT_SUPPORTED_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            watch_poll_interval_seconds: constants::DEFAULT_WATCH_POLL_INTERVAL_SECONDS,
            entry_batch_size: constants::DEFAULT_ENTRY_BATCH_SIZE,
            max_entry_size_bytes: constants::DEFAULT_MAX_ENTRY_SIZE,
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `config.toml` from `path` if present, merge over defaults, and
    /// validate. A missing file is not an error: the all-defaults config is
    /// returned. A malformed file or out-of-range value is.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();

        let watch_poll_interval_seconds = raw
            .watch_poll_interval_seconds
            .unwrap_or(defaults.watch_poll_interval_seconds);
        if !(constants::MIN_WATCH_POLL_INTERVAL_SECONDS..=constants::MAX_WATCH_POLL_INTERVAL_SECONDS)
            .contains(&watch_poll_interval_seconds)
        {
            return Err(ConfigError::ValueOutOfRange {
                field: "watch_poll_interval_seconds".to_string(),
                value: watch_poll_interval_seconds.to_string(),
                expected: format!(
                    "{}..={}",
                    constants::MIN_WATCH_POLL_INTERVAL_SECONDS,
                    constants::MAX_WATCH_POLL_INTERVAL_SECONDS
                ),
            });
        }

        let max_upload_size_mb = raw.max_upload_size_mb.unwrap_or(defaults.max_upload_size_mb);
        if max_upload_size_mb == 0 {
            return Err(ConfigError::ValueOutOfRange {
                field: "max_upload_size_mb".to_string(),
                value: "0".to_string(),
                expected: "> 0".to_string(),
            });
        }

        Ok(AppConfig {
            log_upload_dir: raw.log_upload_dir.unwrap_or(defaults.log_upload_dir),
            log_watch_dir: raw.log_watch_dir.unwrap_or(defaults.log_watch_dir),
            max_upload_size_mb,
            supported_extensions: raw
                .supported_extensions
                .unwrap_or(defaults.supported_extensions),
            watch_poll_interval_seconds,
            entry_batch_size: raw.entry_batch_size.unwrap_or(defaults.entry_batch_size),
            max_entry_size_bytes: raw
                .max_entry_size_bytes
                .unwrap_or(defaults.max_entry_size_bytes),
            log_level: raw.log_level.unwrap_or(defaults.log_level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.max_upload_size_mb, constants::DEFAULT_MAX_UPLOAD_SIZE_MB);
    }

    #[test]
    fn loads_and_overrides_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_upload_size_mb = 250\nwatch_poll_interval_seconds = 10\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.max_upload_size_mb, 250);
        assert_eq!(config.watch_poll_interval_seconds, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn out_of_range_poll_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "watch_poll_interval_seconds = 0\n").unwrap();
        let result = AppConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::ValueOutOfRange { .. })));
    }
}
