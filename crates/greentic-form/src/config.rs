use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use form_spec::spec::{DEFAULT_ADDED_SUFFIX, DEFAULT_REMOVED_SUFFIX};

/// Form-wide settings, loadable from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Disables every field regardless of its own rules.
    pub disabled: bool,
    /// Reports errors on fields the user has not interacted with yet.
    pub show_validation_before_touched: bool,
    /// Suffix for the added-items entry of change-tracking fields without their own.
    pub added_suffix: String,
    /// Suffix for the removed-items entry of change-tracking fields without their own.
    pub removed_suffix: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            show_validation_before_touched: false,
            added_suffix: DEFAULT_ADDED_SUFFIX.to_string(),
            removed_suffix: DEFAULT_REMOVED_SUFFIX.to_string(),
        }
    }
}

/// Errors raised while loading a [`FormConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a config file; `.json` files are read as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_toml_str(&raw)
        }
    }
}
