pub mod audit;
pub mod config;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use audit::{AuditEvent, AuditSink, JsonlAuditLogger};
pub use config::AssistantConfig;
pub use models::{PatientRecord, Severity, Sex};
pub use pipeline::workflow::{CaseRequest, CaseState, WorkflowEngine, WorkflowError};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides
/// [`config::default_log_filter`]. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
