//! User configuration.
//!
//! A small TOML file holds the defaults the CLI flags can override: where
//! the order export lives and an optional seller cut for the seller-portal
//! mode.
//!
//! ```toml
//! # ~/.config/botdash/config.toml
//! dataset = "/data/dataset_olist_final_limpo.csv"
//! seller = "4a3ca9315b744ce9f8e9374361493884"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_DIR_NAME: &str = "botdash";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// File name tried in the working directory when nothing else names a
/// dataset.
pub const DEFAULT_DATASET_FILE: &str = "dataset_olist_final_limpo.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine the user config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Path to the order export CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,

    /// Seller id applied to every query (seller portal mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
}

impl BotConfig {
    /// Default config file location. `XDG_CONFIG_HOME` wins over the
    /// platform directory when set.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg)
                    .join(CONFIG_DIR_NAME)
                    .join(CONFIG_FILE_NAME));
            }
        }
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location; a missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. Here a missing file IS an error, the
    /// user asked for that file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Write to the default location, creating parent directories.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Effective dataset path: CLI flag, then config, then the default
    /// file name in the working directory.
    pub fn dataset_path(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_override {
            return path.to_path_buf();
        }
        self.dataset
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_from_reads_both_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "dataset = \"/data/orders.csv\"\nseller = \"s1\"\n").unwrap();
        let config = BotConfig::load_from(&path).unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("/data/orders.csv")));
        assert_eq!(config.seller.as_deref(), Some("s1"));
    }

    #[test]
    fn missing_keys_default_to_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        let config = BotConfig::load_from(&path).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = BotConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "dataset = [not toml").unwrap();
        let err = BotConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn serializes_only_set_keys() {
        let config = BotConfig {
            dataset: Some(PathBuf::from("/data/orders.csv")),
            seller: None,
        };
        let raw = toml::to_string_pretty(&config).unwrap();
        assert!(raw.contains("dataset"));
        assert!(!raw.contains("seller"));
    }

    #[test]
    fn save_to_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = BotConfig {
            dataset: Some(PathBuf::from("/data/orders.csv")),
            seller: Some("s9".to_string()),
        };
        config.save_to(&path).unwrap();
        assert_eq!(BotConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn dataset_path_prefers_the_cli_flag() {
        let config = BotConfig {
            dataset: Some(PathBuf::from("/from/config.csv")),
            seller: None,
        };
        assert_eq!(
            config.dataset_path(Some(Path::new("/from/flag.csv"))),
            PathBuf::from("/from/flag.csv")
        );
        assert_eq!(
            config.dataset_path(None),
            PathBuf::from("/from/config.csv")
        );
        assert_eq!(
            BotConfig::default().dataset_path(None),
            PathBuf::from(DEFAULT_DATASET_FILE)
        );
    }
}
