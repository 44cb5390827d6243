// Structured logging initialization and the dedicated audit stream
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub mod audit;

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("logging already initialized for this process")]
    AlreadyInitialized,
}

/// Initializes the global `tracing` subscriber from an [`AppConfig`]'s
/// logging section, the way the teacher's `LoggingManager::initialize` does.
pub struct LoggingManager {
    config: LoggingConfig,
}

impl LoggingManager {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn initialize(&self) -> Result<(), LoggingError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let result = if self.config.format == "json" {
            Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_timer(UtcTime::rfc_3339()))
                .try_init()
        } else {
            Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_timer(UtcTime::rfc_3339()))
                .try_init()
        };
        result.map_err(|_| LoggingError::AlreadyInitialized)?;

        info!("logging initialized at level {}", self.config.level);
        Ok(())
    }

    pub fn create_audit_logger(&self) -> audit::AuditLogger {
        audit::AuditLogger::new(self.config.clone())
    }
}
