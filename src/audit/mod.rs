//! Append-only audit trail.
//!
//! Every node that records an action goes through a single [`AuditSink`].
//! Records are newline-delimited JSON, each stamped with a server-side
//! UTC `ts` at write time.

pub mod event;
pub mod logger;
mod log_hygiene;

use thiserror::Error;

pub use event::{AuditEvent, EVENT_ALERT, EVENT_ERROR, EVENT_NO_ALERT};
pub use logger::{JsonlAuditLogger, MemoryAuditSink};

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit trail lock poisoned")]
    Poisoned,

    #[error("Corrupt audit record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

/// Destination for audit events. Must be safe to call from concurrent cases;
/// each append is atomic at record granularity.
pub trait AuditSink: Send + Sync {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError>;
}
