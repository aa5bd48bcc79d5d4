//! Load configuration and its external settings form.
//!
//! [`LoadConfig`] is what the engine consumes. [`LoadSettings`] is the
//! serde-facing shape for a TOML settings file, where the worker pool size
//! arrives as a string and must parse to a positive integer; anything else
//! fails startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default number of load workers when the settings file does not say.
const DEFAULT_WORKER_THREADS: usize = 4;

/// Default suffix appended to a table's file stem.
const DEFAULT_SUFFIX: &str = ".ron";

/// Subdirectory of the data root holding snapshot cache files.
const DEFAULT_CACHE_DIR: &str = ".res-cache";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid worker pool size [{value}]: must be a positive integer")]
    InvalidWorkerThreads { value: String },

    #[error("failed to parse settings: {0}")]
    Settings(String),
}

/// Configuration for one load pass.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Root directory scanned for resource files.
    pub data_root: PathBuf,
    /// Directory holding snapshot cache files.
    pub cache_dir: PathBuf,
    /// Suffix appended to a table's file stem when `FILE_NAME` is not set.
    pub default_suffix: String,
    /// Size of the dedicated load worker pool. Explicit, never derived from
    /// the machine's core count.
    pub worker_threads: usize,
}

impl LoadConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        let cache_dir = data_root.join(DEFAULT_CACHE_DIR);
        Self {
            data_root,
            cache_dir,
            default_suffix: DEFAULT_SUFFIX.to_string(),
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }

    /// Build a config from externally supplied settings, validating the
    /// worker pool size.
    pub fn from_settings(settings: LoadSettings) -> Result<Self, ConfigError> {
        let mut config = Self::new(settings.data_root);
        if let Some(cache_dir) = settings.cache_dir {
            config.cache_dir = cache_dir;
        }
        if let Some(suffix) = settings.default_suffix {
            config.default_suffix = suffix;
        }
        if let Some(raw) = settings.worker_threads {
            config.worker_threads = parse_worker_threads(&raw)?;
        }
        Ok(config)
    }
}

/// Serde-facing settings, typically read from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSettings {
    pub data_root: PathBuf,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_suffix: Option<String>,
    /// Worker pool size as written in the settings file.
    #[serde(default)]
    pub worker_threads: Option<String>,
}

impl LoadSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Settings(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// Parse an externally supplied worker pool size. Rejects anything that is
/// not a positive integer.
pub fn parse_worker_threads(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidWorkerThreads {
            value: raw.to_string(),
        }),
    }
}
