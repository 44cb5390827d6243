// Configuration management and loading
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AppConfig, ConfigError, LoggingConfig, NodeConfig, ReplayStoreConfig, SphinxConfig};

/// Loads, saves and validates [`AppConfig`], the way the teacher's
/// `ConfigManager` wraps an `Arc<RwLock<AppConfig>>` behind an async API.
pub struct ConfigManager {
    config_path: PathBuf,
    config: Arc<RwLock<AppConfig>>,
    auto_save: bool,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path, config: Arc::new(RwLock::new(AppConfig::default())), auto_save: false }
    }

    pub fn with_auto_save(config_path: PathBuf) -> Self {
        Self { config_path, config: Arc::new(RwLock::new(AppConfig::default())), auto_save: true }
    }

    fn is_json(&self) -> bool {
        self.config_path.extension().and_then(|ext| ext.to_str()) == Some("json")
    }

    /// Loads the config file if present; otherwise persists the defaults.
    pub async fn load(&self) -> Result<(), ConfigError> {
        if self.config_path.exists() {
            info!("Loading configuration from: {:?}", self.config_path);
            let content = fs::read_to_string(&self.config_path)
                .map_err(|source| ConfigError::Io { path: self.config_path.clone(), source })?;

            let loaded: AppConfig = if self.is_json() {
                serde_json::from_str(&content)
                    .map_err(|e| ConfigError::Parse { path: self.config_path.clone(), format: "json", source: Box::new(e) })?
            } else {
                serde_yaml::from_str(&content)
                    .map_err(|e| ConfigError::Parse { path: self.config_path.clone(), format: "yaml", source: Box::new(e) })?
            };

            *self.config.write().await = loaded;
            debug!("Configuration loaded successfully");
        } else {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            self.save().await?;
        }
        Ok(())
    }

    pub async fn save(&self) -> Result<(), ConfigError> {
        info!("Saving configuration to: {:?}", self.config_path);
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io { path: parent.to_path_buf(), source })?;
        }

        let config = self.config.read().await;
        let content = if self.is_json() {
            serde_json::to_string_pretty(&*config)
                .map_err(|e| ConfigError::Parse { path: self.config_path.clone(), format: "json", source: Box::new(e) })?
        } else {
            serde_yaml::to_string(&*config)
                .map_err(|e| ConfigError::Parse { path: self.config_path.clone(), format: "yaml", source: Box::new(e) })?
        };

        fs::write(&self.config_path, content).map_err(|source| ConfigError::Io { path: self.config_path.clone(), source })?;
        debug!("Configuration saved successfully");
        Ok(())
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    pub async fn update_config(&self, new_config: AppConfig) -> Result<(), ConfigError> {
        *self.config.write().await = new_config;
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn update_node_config(&self, node: NodeConfig) -> Result<(), ConfigError> {
        self.config.write().await.node = node;
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn update_sphinx_config(&self, sphinx: SphinxConfig) -> Result<(), ConfigError> {
        self.config.write().await.sphinx = sphinx;
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn update_logging_config(&self, logging: LoggingConfig) -> Result<(), ConfigError> {
        self.config.write().await.logging = logging;
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn update_replay_store_config(&self, replay_store: ReplayStoreConfig) -> Result<(), ConfigError> {
        self.config.write().await.replay_store = replay_store;
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Validates the loaded configuration, collecting every problem found
    /// rather than stopping at the first.
    pub async fn validate(&self) -> Result<(), ConfigError> {
        let config = self.config.read().await;
        let mut errors = Vec::new();

        if config.sphinx.max_hops == 0 {
            errors.push("sphinx.max_hops must be greater than 0".to_string());
        }
        if config.sphinx.payload_size == 0 {
            errors.push("sphinx.payload_size must be greater than 0".to_string());
        }
        if !["error", "warn", "info", "debug", "trace"].contains(&config.logging.level.as_str()) {
            errors.push(format!("invalid logging level: {}", config.logging.level));
        }
        if !["json", "compact"].contains(&config.logging.format.as_str()) {
            errors.push(format!("invalid logging format: {}", config.logging.format));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }

    /// Overrides config fields from `NYM_*` environment variables.
    pub async fn load_from_env(&self) -> Result<(), ConfigError> {
        let mut config = self.config.write().await;

        if let Ok(node_id) = std::env::var("NYM_NODE_ID") {
            config.node.node_id = node_id;
        }
        if let Ok(data_dir) = std::env::var("NYM_DATA_DIR") {
            config.node.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(max_hops) = std::env::var("NYM_MAX_HOPS") {
            if let Ok(v) = max_hops.parse() {
                config.sphinx.max_hops = v;
            }
        }
        if let Ok(log_level) = std::env::var("NYM_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        info!("Configuration overridden from environment variables");
        drop(config);
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }

    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    pub fn is_auto_save(&self) -> bool {
        self.auto_save
    }
}

impl Clone for ConfigManager {
    fn clone(&self) -> Self {
        Self { config_path: self.config_path.clone(), config: self.config.clone(), auto_save: self.auto_save }
    }
}
