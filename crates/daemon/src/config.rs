// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state directory layout and `herald.toml`

use std::path::{Path, PathBuf};

use herald_engine::BusConfig;
use herald_storage::FileLogWriterConfig;
use serde::Deserialize;
use thiserror::Error;

/// Name of the optional config file inside the state directory
pub const CONFIG_FILE_NAME: &str = "herald.toml";

/// Where the write-ahead log lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    /// Segmented JSONL files under `<state_dir>/log`
    #[default]
    File,
    /// Process memory; unsent messages do not survive a restart
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Contents of `herald.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    log_backend: LogBackend,
    max_segment_bytes: Option<u64>,
    keep_segments: Option<usize>,
    socket_path: Option<PathBuf>,
    #[serde(flatten)]
    bus: BusConfig,
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    /// The config file that was loaded, if any
    pub config_path: Option<PathBuf>,
    pub socket_path: PathBuf,
    /// PID file, held under an exclusive lock while the daemon runs
    pub lock_path: PathBuf,
    /// Daemon's own tracing output
    pub log_path: PathBuf,
    /// Write-ahead log segments
    pub event_log_dir: PathBuf,
    /// Persisted destination records
    pub destinations_dir: PathBuf,
    pub log_backend: LogBackend,
    pub log_writer: FileLogWriterConfig,
    pub bus: BusConfig,
}

impl Config {
    /// Resolve the state directory from the environment, then load config
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::for_state_dir(&state_dir()?, explicit)
    }

    /// Build config for a state directory.
    ///
    /// An explicit config path must exist; otherwise `herald.toml` in the
    /// state directory is read when present, and defaults apply when not.
    pub fn for_state_dir(state_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(state_dir.join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };

        let file = match &config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Read(path.clone(), e))?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| ConfigError::Parse(path.clone(), e))?
            }
            None => ConfigFile::default(),
        };

        if file.bus.redelivery_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "redelivery_interval must be greater than zero".to_string(),
            ));
        }
        if file.bus.retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.attempts must be at least 1".to_string(),
            ));
        }

        let defaults = FileLogWriterConfig::default();
        let log_writer = FileLogWriterConfig {
            max_segment_bytes: file.max_segment_bytes.unwrap_or(defaults.max_segment_bytes),
            keep_segments: file.keep_segments.unwrap_or(defaults.keep_segments),
        };

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            config_path,
            socket_path: file
                .socket_path
                .unwrap_or_else(|| state_dir.join("heraldd.sock")),
            lock_path: state_dir.join("heraldd.pid"),
            log_path: state_dir.join("heraldd.log"),
            event_log_dir: state_dir.join("log"),
            destinations_dir: state_dir.join("destinations"),
            log_backend: file.log_backend,
            log_writer,
            bus: file.bus,
        })
    }
}

/// State directory: `HERALD_STATE_DIR`, else `$XDG_STATE_HOME/herald`,
/// else `~/.local/state/herald`
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    resolve_state_dir(
        std::env::var_os("HERALD_STATE_DIR").map(PathBuf::from),
        std::env::var_os("XDG_STATE_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn resolve_state_dir(
    explicit: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir);
    }
    if let Some(xdg) = xdg_state_home.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(xdg.join("herald"));
    }
    home.map(|h| h.join(".local/state/herald"))
        .ok_or(ConfigError::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
