//! Startup configuration.
//!
//! Values come from the process environment (after `.env` is loaded). Parsing
//! goes through [`Config::from_lookup`] so it can be exercised with a plain map.

use std::path::{Path, PathBuf};

use thiserror::Error;
use utils::assets::{DATABASE_FILE_NAME, LOG_DIR_NAME};

use crate::file_logging::FileLoggingConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Blob storage connection string; `None` runs images in degraded mode.
    pub blob_storage_url: Option<String>,
    pub host: String,
    /// 0 asks the OS for a free port.
    pub port: u16,
    pub log_level: String,
    pub file_logging: FileLoggingConfig,
}

impl Config {
    pub fn from_env(asset_dir: &Path) -> Result<Self, ConfigError> {
        Self::from_lookup(asset_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(asset_dir: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}", asset_dir.join(DATABASE_FILE_NAME).display())
        });

        let port = match non_empty("BACKEND_PORT").or_else(|| non_empty("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 0,
        };

        let file_logging = FileLoggingConfig {
            enabled: lookup("KANBAN_FILE_LOGGING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_dir: non_empty("KANBAN_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| asset_dir.join(LOG_DIR_NAME)),
            max_files: lookup("KANBAN_LOG_MAX_FILES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(FileLoggingConfig::DEFAULT_MAX_FILES),
        };

        Ok(Self {
            database_url,
            blob_storage_url: non_empty("BLOB_STORAGE_URL"),
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_level: non_empty("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            file_logging,
        })
    }
}
