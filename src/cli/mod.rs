// CLI surface: keygen, run, inspect - the ambient interfaces named in SPEC_FULL.md 6.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::config::manager::ConfigManager;
use crate::config::ConfigError;
use crate::sphinx::node::NodeKeys;
use crate::storage::{FileReplayStore, ReplayStoreError};

#[derive(Parser)]
#[command(name = "sphinx-mixcore")]
#[command(about = "Sphinx mix-network cryptographic core")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "./config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and persist node keys
    Keygen,
    /// Load config, init logging, init the node and block serving
    Run,
    /// Print the on-disk config/keys/replay-store status
    Inspect,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ReplayStore(#[from] ReplayStoreError),
    #[error("failed to write key file {0:?}: {1}")]
    WriteKey(PathBuf, std::io::Error),
    #[error("failed to read key file {0:?}: {1}")]
    ReadKey(PathBuf, std::io::Error),
    #[error("key file {0:?} has {1} bytes, expected 32")]
    MalformedKeyFile(PathBuf, usize),
}

/// Generates a fresh node keypair and writes the private key (hex-encoded)
/// to the path in `config.node.private_key_path`.
pub async fn keygen(manager: &ConfigManager) -> Result<NodeKeys, CliError> {
    let config = manager.get_config().await;
    let mut rng = rand::rngs::OsRng;
    let keys = NodeKeys::generate(&mut rng);

    if let Some(parent) = config.node.private_key_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::WriteKey(config.node.private_key_path.clone(), e))?;
    }
    let mut contents = hex::encode(keys.id);
    contents.push('\n');
    contents.push_str(&hex::encode(keys.private_key_bytes()));
    contents.push('\n');
    std::fs::write(&config.node.private_key_path, contents)
        .map_err(|e| CliError::WriteKey(config.node.private_key_path.clone(), e))?;

    info!(node_id = %hex::encode(keys.id), path = ?config.node.private_key_path, "generated node keys");
    Ok(keys)
}

/// Loads a previously generated keypair from `private_key_path`.
pub fn load_keys(private_key_path: &std::path::Path) -> Result<NodeKeys, CliError> {
    let contents = std::fs::read_to_string(private_key_path)
        .map_err(|e| CliError::ReadKey(private_key_path.to_path_buf(), e))?;
    let mut lines = contents.lines();
    let id_hex = lines.next().unwrap_or_default();
    let key_hex = lines.next().unwrap_or_default();

    let id_bytes = hex::decode(id_hex).map_err(|_| CliError::MalformedKeyFile(private_key_path.to_path_buf(), id_hex.len()))?;
    let key_bytes = hex::decode(key_hex).map_err(|_| CliError::MalformedKeyFile(private_key_path.to_path_buf(), key_hex.len()))?;

    let id: [u8; 16] = id_bytes
        .try_into()
        .map_err(|v: Vec<u8>| CliError::MalformedKeyFile(private_key_path.to_path_buf(), v.len()))?;
    let private_key: [u8; 32] = key_bytes
        .try_into()
        .map_err(|v: Vec<u8>| CliError::MalformedKeyFile(private_key_path.to_path_buf(), v.len()))?;

    Ok(NodeKeys::from_private_key(id, private_key))
}

/// Prints a human-readable summary of on-disk node state.
pub async fn inspect(manager: &ConfigManager) -> Result<(), CliError> {
    let config = manager.get_config().await;
    println!("config path: {:?}", manager.config_path());
    println!("node id: {}", if config.node.node_id.is_empty() { "<ungenerated>" } else { &config.node.node_id });
    println!("sphinx: max_hops={} payload_size={}", config.sphinx.max_hops, config.sphinx.payload_size);

    match load_keys(&config.node.private_key_path) {
        Ok(keys) => println!("keys: present at {:?} (id {})", config.node.private_key_path, hex::encode(keys.id)),
        Err(_) => println!("keys: not found at {:?}", config.node.private_key_path),
    }

    if config.replay_store.persistent {
        let store = FileReplayStore::open(&config.replay_store.path)?;
        println!("replay store: {:?} ({} tags)", store.path(), store.len());
    } else {
        println!("replay store: in-memory only (not persisted)");
    }

    Ok(())
}
