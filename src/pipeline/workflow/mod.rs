//! Case workflow: a fixed directed graph of nodes threading one
//! [`CaseState`] from intake to an alert or no-alert outcome.

pub mod engine;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod notify;
pub mod state;

pub use engine::{Collaborators, WorkflowEngine};
pub use error::WorkflowError;
pub use graph::{AlertRoute, Node, NodeId};
pub use notify::{AlertNotice, AlertNotifier, LogNotifier};
pub use state::{CaseRequest, CaseState};
