//! Persistence: key-value backends, data directory and configuration.
//!
//! The recommendation store only needs two string keys holding JSON arrays,
//! so every backend implements the small [`KeyValueStore`] trait.

mod config;
mod file;
mod memory;

pub use config::{Config, LoggingConfig, RecommendationsConfig};
pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StorageError;

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Returns `~/.config/nudgewell[-dev]/` based on NUDGEWELL_ENV.
///
/// Set NUDGEWELL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    let env = std::env::var("NUDGEWELL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("nudgewell-dev")
    } else {
        base_dir.join("nudgewell")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
