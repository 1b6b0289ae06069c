//! Application configuration: TOML file, then `DUALSINK_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::Error;
use crate::logger::rotating::{DEFAULT_FILE_PATTERN, DEFAULT_ROTATION_SIZE};

/// File sink settings. The severity threshold is fixed and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Directory receiving rotated log files.
    pub dir: PathBuf,
    /// strftime pattern for each new file name.
    pub file_pattern: String,
    /// Bytes after which the active file is abandoned.
    pub rotation_size: u64,
    /// fsync after every record.
    pub sync_every_write: bool,
    /// Overrides the executable name in the process-name field.
    pub process_name: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            rotation_size: DEFAULT_ROTATION_SIZE,
            sync_every_write: true,
            process_name: None,
        }
    }
}

impl LogConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Load `path` when given (it must exist), then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| {
                    Error::Configuration(format!("cannot read {}: {e}", p.display()))
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        cfg.apply_env_with(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply overrides from a variable lookup:
    /// - DUALSINK_LOG_DIR
    /// - DUALSINK_LOG_ROTATION_SIZE
    /// - DUALSINK_PROCESS_NAME
    /// - DUALSINK_DB
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DUALSINK_LOG_DIR") {
            self.log.dir = PathBuf::from(dir);
        }
        if let Some(size) = lookup("DUALSINK_LOG_ROTATION_SIZE") {
            self.log.rotation_size = size.trim().parse().map_err(|_| {
                Error::Configuration(format!("DUALSINK_LOG_ROTATION_SIZE is not a byte count: {size}"))
            })?;
        }
        if let Some(name) = lookup("DUALSINK_PROCESS_NAME") {
            self.log.process_name = Some(name);
        }
        if let Some(db) = lookup("DUALSINK_DB") {
            self.store.path = Some(PathBuf::from(db));
        }
        Ok(())
    }
}
