// Node configuration module
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod manager;

/// Errors raised while loading, parsing or validating [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {0:?}")]
    NotFound(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?} as {format}: {source}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("configuration invalid: {0}")]
    Invalid(String),
}

/// Main application configuration: node identity, Sphinx geometry, replay
/// store location, and logging - the ambient stack SPEC_FULL.md 2 (9) names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub sphinx: SphinxConfig,
    pub replay_store: ReplayStoreConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            sphinx: SphinxConfig::default(),
            replay_store: ReplayStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Node identity and data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Hex-encoded 16-byte node id; empty until `keygen` has run.
    pub node_id: String,
    pub data_dir: PathBuf,
    pub private_key_path: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            data_dir: PathBuf::from("./data"),
            private_key_path: PathBuf::from("./data/node.key"),
        }
    }
}

/// Sphinx packet geometry: the `r`/`m` half of `SphinxParams` (`k` is fixed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphinxConfig {
    pub max_hops: usize,
    pub payload_size: usize,
}

impl Default for SphinxConfig {
    fn default() -> Self {
        Self { max_hops: 5, payload_size: 1024 }
    }
}

impl SphinxConfig {
    pub fn to_params(&self) -> crate::sphinx::SphinxParams {
        crate::sphinx::SphinxParams::new(self.max_hops, self.payload_size)
    }
}

/// Where and how the replay cache persists across restarts (4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStoreConfig {
    pub persistent: bool,
    pub path: PathBuf,
}

impl Default for ReplayStoreConfig {
    fn default() -> Self {
        Self { persistent: true, path: PathBuf::from("./data/replay.log") }
    }
}

/// Logging configuration, mirroring the teacher's `LoggingConfig` trimmed to
/// what a single-process node needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "compact"
    pub audit_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            audit_file: Some(PathBuf::from("./logs/audit.log")),
        }
    }
}
