use clap::Parser;
use tracing::info;

use sphinx_mixcore::cli::{self, Cli, Commands};
use sphinx_mixcore::config::manager::ConfigManager;
use sphinx_mixcore::logging::LoggingManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let manager = ConfigManager::new(args.config.clone());
    manager.load().await?;
    manager.load_from_env().await?;
    manager.validate().await?;

    let config = manager.get_config().await;
    LoggingManager::new(config.logging.clone()).initialize().ok();

    match args.command {
        Commands::Keygen => {
            cli::keygen(&manager).await?;
        }
        Commands::Run => {
            run_node(&manager).await?;
        }
        Commands::Inspect => {
            cli::inspect(&manager).await?;
        }
    }

    Ok(())
}

/// Loads node keys, wires up the replay store, and blocks waiting for a
/// shutdown signal. Receiving and forwarding packets over the wire is a
/// stub collaborator's job, not this core's.
async fn run_node(manager: &ConfigManager) -> Result<(), Box<dyn std::error::Error>> {
    use sphinx_mixcore::storage::FileReplayStore;
    use sphinx_mixcore::{Node, SharedReplayCache};
    use std::sync::Arc;

    let config = manager.get_config().await;
    let keys = cli::load_keys(&config.node.private_key_path)?;
    let params = config.sphinx.to_params();

    let replay_cache: SharedReplayCache = if config.replay_store.persistent {
        Arc::new(FileReplayStore::open(&config.replay_store.path)?)
    } else {
        Arc::new(sphinx_mixcore::InMemoryReplayCache::new())
    };

    let node_id = hex::encode(keys.id);
    let node = Node::new(keys, params, replay_cache);
    info!(node_id = %node_id, "node ready, awaiting shutdown signal");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    drop(node);
    Ok(())
}
