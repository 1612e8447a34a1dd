//! Configuration management for imod-recipe

pub mod schema;

pub use schema::Config;

use crate::error::{RecipeError, RecipeResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imod-recipe")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imod-recipe")
    }

    /// Get the default stage root
    pub fn default_stage_root() -> PathBuf {
        Self::state_dir().join("stage")
    }

    /// Get the default download cache
    pub fn default_download_cache() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imod-recipe")
            .join("downloads")
    }

    /// Get the audit log path
    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Stage root from config, falling back to the default
    pub fn stage_root(config: &Config) -> PathBuf {
        config
            .paths
            .stage_root
            .clone()
            .unwrap_or_else(Self::default_stage_root)
    }

    /// Download cache from config, falling back to the default
    pub fn download_cache(config: &Config) -> PathBuf {
        config
            .paths
            .download_cache
            .clone()
            .unwrap_or_else(Self::default_download_cache)
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> RecipeResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> RecipeResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| RecipeError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| RecipeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> RecipeResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            RecipeError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> RecipeResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RecipeError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
