use thiserror::Error;

use super::graph::{AlertRoute, NodeId};
use crate::audit::AuditError;
use crate::config::ConfigError;
use crate::pipeline::rag::RagError;
use crate::pipeline::safety::SafetyError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid case input: {0}")]
    InvalidCaseInput(String),

    #[error("Collaborator failed in {node}: {source}")]
    CollaboratorFailure {
        node: NodeId,
        #[source]
        source: RagError,
    },

    #[error("Router for {node} returned unregistered route {route}")]
    RoutingMismatch { node: NodeId, route: AlertRoute },

    #[error("Case field already set: {0}")]
    FieldAlreadySet(&'static str),

    #[error("{node} requires {field}, which was not set")]
    MissingField { node: NodeId, field: &'static str },

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Invalid workflow graph: {0}")]
    GraphInvalid(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Guardrail setup failed: {0}")]
    Guardrail(#[from] SafetyError),

    #[error("Collaborator setup failed: {0}")]
    Setup(RagError),
}
