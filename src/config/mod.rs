//! Configuration management for logshape
//!
//! Loads the `[format]` options that control how templates are hashed,
//! serialized and rendered. Values come from a TOML file, then environment
//! overrides, then validation.

use crate::error::{LogshapeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Marker used for variable segments unless configured otherwise
pub const DEFAULT_WILDCARD: &str = "*";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub format: FormatOptions,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// How a variable segment's observed values are iterated and serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOrder {
    /// Order in which values were first seen
    #[default]
    Insertion,
    /// Lexicographic by value text
    Sorted,
}

impl ValueOrder {
    /// Parse order from configuration string
    pub fn parse_order(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "insertion" => Some(Self::Insertion),
            "sorted" => Some(Self::Sorted),
            _ => None,
        }
    }
}

/// When to color variable markers in rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// Defer to the `colored` crate's terminal/env detection
    #[default]
    Auto,
    Always,
    Never,
}

impl Highlight {
    /// Parse highlight mode from configuration string
    pub fn parse_mode(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

/// Options that shape format hashing, serialization and rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Shape token and display marker for variable segments
    #[serde(default = "default_wildcard")]
    pub wildcard: String,
    #[serde(default)]
    pub value_order: ValueOrder,
    #[serde(default)]
    pub highlight: Highlight,
    /// Right-aligned width of the count column in rendered samples
    #[serde(default = "default_count_width")]
    pub count_width: usize,
    /// Number of hex characters shown as the display-only short id
    #[serde(default = "default_short_id_len")]
    pub short_id_len: usize,
}

fn default_wildcard() -> String {
    DEFAULT_WILDCARD.to_string()
}

fn default_count_width() -> usize {
    6
}

fn default_short_id_len() -> usize {
    8
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            wildcard: default_wildcard(),
            value_order: ValueOrder::default(),
            highlight: Highlight::default(),
            count_width: default_count_width(),
            short_id_len: default_short_id_len(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LogshapeError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| LogshapeError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| LogshapeError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: LOGSHAPE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `LOGSHAPE_`-prefixed key/value pairs, ignoring everything else
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("LOGSHAPE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "FORMAT__WILDCARD" => {
                self.format.wildcard = value.to_string();
            }
            "FORMAT__VALUE_ORDER" => {
                self.format.value_order =
                    ValueOrder::parse_order(value).ok_or_else(|| {
                        LogshapeError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Unknown value order '{}'", value),
                        }
                    })?;
            }
            "FORMAT__HIGHLIGHT" => {
                self.format.highlight =
                    Highlight::parse_mode(value).ok_or_else(|| LogshapeError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Unknown highlight mode '{}'", value),
                    })?;
            }
            "FORMAT__SHORT_ID_LEN" => {
                self.format.short_id_len =
                    value.parse().map_err(|_| LogshapeError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LogshapeError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("logshape").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            format: FormatOptions::default(),
        }
    }
}
