//! Persisted category configuration.
//!
//! The configuration is a JSON file holding a flat mapping of keys to lists
//! of strings:
//!
//! ```json
//! {
//!   "EXTENSIONS": {
//!     "Images": [".jpg", ".png"],
//!     "Documents": [".pdf", ".txt"]
//!   },
//!   "EXCLUDE": ["*.part", "desktop.ini"]
//! }
//! ```
//!
//! `EXTENSIONS` is required and its category order is significant: when an
//! extension appears under two categories, the first one wins. `EXCLUDE`
//! is optional and lists file-name glob patterns that a sort leaves alone.
//!
//! A missing file silently yields the built-in table. A file that exists but
//! cannot be read or parsed also yields the built-in table, along with a
//! warning for the caller to surface.

use crate::classifier::CategoryTable;
use crate::error::{SortError, SortResult};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Engine configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "EXTENSIONS")]
    pub extensions: CategoryTable,

    #[serde(rename = "EXCLUDE", default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extensions: CategoryTable::default(),
            exclude: Vec::new(),
        }
    }
}

/// Outcome of [`AppConfig::load`].
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: AppConfig,
    /// Set when a present config file was rejected in favor of the defaults.
    pub warning: Option<SortError>,
}

impl AppConfig {
    /// Loads the configuration at `path`, falling back to defaults.
    pub fn load(path: &Path) -> ConfigLoad {
        if !path.exists() {
            return ConfigLoad {
                config: Self::default(),
                warning: None,
            };
        }

        match Self::load_from_file(path) {
            Ok(config) => ConfigLoad {
                config,
                warning: None,
            },
            Err(e) => {
                tracing::warn!("{}; using built-in categories", e);
                ConfigLoad {
                    config: Self::default(),
                    warning: Some(e),
                }
            }
        }
    }

    /// Loads and validates the configuration at `path` without any fallback.
    pub fn load_from_file(path: &Path) -> SortResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| SortError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| SortError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.exclude_patterns()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> SortResult<()> {
        let write_failed = |source| SortError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(path, json + "\n").map_err(write_failed)
    }

    /// Compiles the `EXCLUDE` globs.
    pub fn exclude_patterns(&self) -> SortResult<Vec<Pattern>> {
        self.exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| SortError::InvalidExcludePattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// Resolves the config path: an explicit one, or [`DEFAULT_CONFIG_FILE`].
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
