pub mod config;
pub mod recommend;

use std::path::PathBuf;
use std::sync::Arc;

use nudgewell_core::storage::data_dir;
use nudgewell_core::{Config, FileStore, RecommendationEngine};
use tracing_subscriber::EnvFilter;

/// Resolved data directory shared by every command.
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = match dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                dir
            }
            None => data_dir()?,
        };
        Ok(Self { dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    pub fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        Ok(Config::load_from(&self.config_path())?)
    }

    pub async fn open_engine(&self) -> Result<RecommendationEngine, Box<dyn std::error::Error>> {
        let config = self.load_config()?;
        let store = FileStore::open(self.dir.join("store"))?;
        Ok(RecommendationEngine::new(Arc::new(store), &config.recommendations).await)
    }
}

/// Install the tracing subscriber.
///
/// NUDGEWELL_LOG wins over RUST_LOG, which wins over the configured level.
pub fn init_logging(workspace: &Workspace) {
    let configured = workspace
        .load_config()
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let directive = std::env::var("NUDGEWELL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or(configured);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Using data directory {}", workspace.dir.display());
}
