//! TOML-based application configuration.
//!
//! Stores:
//! - Recommendation list caps (stored entries, active view size)
//! - Log level used when no filter is given in the environment
//!
//! Configuration is stored at `~/.config/nudgewell/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Recommendation lifecycle caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    /// Entries kept in storage after each merge (oldest evicted first)
    #[serde(default = "default_max_stored")]
    pub max_stored: usize,
    /// Entries returned by the active view
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when NUDGEWELL_LOG / RUST_LOG are unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nudgewell/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_stored() -> usize {
    20
}
fn default_max_active() -> usize {
    5
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            max_stored: default_max_stored(),
            max_active: default_max_active(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, or return defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, or return defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if a cap is zero.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let caps = [
            ("recommendations.max_stored", self.recommendations.max_stored),
            ("recommendations.max_active", self.recommendations.max_active),
        ];
        for (key, value) in caps {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let (parent_path, leaf) = key.rsplit_once('.').ok_or_else(unknown)?;
        let mut parent = &mut json;
        for part in parent_path.split('.') {
            parent = parent.get_mut(part).ok_or_else(unknown)?;
        }
        let slot = parent.get_mut(leaf).ok_or_else(unknown)?;

        let new_value = match &*slot {
            serde_json::Value::Number(_) => {
                let n: u64 = value
                    .parse()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::from(n)
            }
            serde_json::Value::Bool(_) => {
                let b: bool = value
                    .parse()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?;
                serde_json::Value::from(b)
            }
            _ => serde_json::Value::from(value),
        };
        *slot = new_value;

        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
