//! Storage engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the scoped storage engine.
///
/// Quota caps are derived configuration, never persisted alongside the
/// data they bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the per-user content trees.
    pub storage_root: PathBuf,

    /// Global cap across every user, in bytes. Unset means unbounded.
    #[serde(default)]
    pub storage_max: Option<u64>,

    /// Per-user cap, in bytes. Unset means unbounded.
    #[serde(default)]
    pub user_storage_max: Option<u64>,
}

impl StorageConfig {
    /// Configuration rooted at `storage_root` with no caps.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            storage_max: None,
            user_storage_max: None,
        }
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let config = StorageConfig::from_toml_str(
            r#"
            storage_root = "/srv/haven"
            storage_max = 1073741824
            user_storage_max = 104857600
            "#,
        )
        .expect("parses");
        assert_eq!(config.storage_root, PathBuf::from("/srv/haven"));
        assert_eq!(config.storage_max, Some(1_073_741_824));
        assert_eq!(config.user_storage_max, Some(104_857_600));
    }

    #[test]
    fn caps_default_to_unbounded() {
        let config =
            StorageConfig::from_toml_str(r#"storage_root = "/srv/haven""#).expect("parses");
        assert_eq!(config.storage_max, None);
        assert_eq!(config.user_storage_max, None);
    }
}
