// A dedicated audit stream for per-hop unwrap outcomes, MAC failures and
// replay rejections, grounded on the teacher's `AuditLogger` shape but
// reshaped around the events this crate actually raises.
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::LoggingConfig;
use crate::sphinx::error::UnwrapError;

/// A single audit-worthy event raised while unwrapping a Sphinx packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditEventKind {
    Forwarded { next_hop: String },
    DeliveredToDestination { dest_id: String },
    DeliveredToClient { client_id: String },
    MacFailure,
    Replay,
    Malformed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: SystemTime,
    pub node_id: String,
    pub kind: AuditEventKind,
}

impl AuditEvent {
    fn risk_is_high(&self) -> bool {
        matches!(self.kind, AuditEventKind::MacFailure | AuditEventKind::Replay)
    }
}

/// Emits one `tracing` event per unwrap outcome; MAC failures and replay
/// rejections are logged at `warn` regardless of the configured level so
/// they are never silently dropped.
pub struct AuditLogger {
    config: LoggingConfig,
}

impl AuditLogger {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn audit_file(&self) -> Option<&std::path::Path> {
        self.config.audit_file.as_deref()
    }

    pub fn log_event(&self, event: AuditEvent) {
        if event.risk_is_high() {
            warn!(event_id = %event.event_id, node_id = %event.node_id, kind = ?event.kind, "sphinx audit event");
        } else {
            info!(event_id = %event.event_id, node_id = %event.node_id, kind = ?event.kind, "sphinx audit event");
        }
    }

    pub fn log_forward(&self, node_id: &str, next_hop: &str) {
        self.log_event(AuditEvent {
            event_id: new_event_id(node_id, "forward"),
            timestamp: SystemTime::now(),
            node_id: node_id.to_string(),
            kind: AuditEventKind::Forwarded { next_hop: next_hop.to_string() },
        });
    }

    pub fn log_deliver_destination(&self, node_id: &str, dest_id: &str) {
        self.log_event(AuditEvent {
            event_id: new_event_id(node_id, "deliver_destination"),
            timestamp: SystemTime::now(),
            node_id: node_id.to_string(),
            kind: AuditEventKind::DeliveredToDestination { dest_id: dest_id.to_string() },
        });
    }

    pub fn log_deliver_client(&self, node_id: &str, client_id: &str) {
        self.log_event(AuditEvent {
            event_id: new_event_id(node_id, "deliver_client"),
            timestamp: SystemTime::now(),
            node_id: node_id.to_string(),
            kind: AuditEventKind::DeliveredToClient { client_id: client_id.to_string() },
        });
    }

    /// Records an unwrap failure, distinguishing MAC/replay (security
    /// relevant) from other malformed-packet errors.
    pub fn log_unwrap_error(&self, node_id: &str, err: &UnwrapError) {
        let kind = match err {
            UnwrapError::IncorrectMAC => AuditEventKind::MacFailure,
            UnwrapError::Replay => AuditEventKind::Replay,
            other => AuditEventKind::Malformed { reason: other.to_string() },
        };
        if matches!(kind, AuditEventKind::Malformed { .. }) {
            error!(node_id = %node_id, error = %err, "sphinx unwrap failed");
        }
        self.log_event(AuditEvent {
            event_id: new_event_id(node_id, "unwrap_error"),
            timestamp: SystemTime::now(),
            node_id: node_id.to_string(),
            kind,
        });
    }
}

fn new_event_id(node_id: &str, kind: &str) -> String {
    format!("{node_id}-{kind}-{}", uuid::Uuid::new_v4())
}
