pub mod rag;
pub mod safety;
pub mod triage;
pub mod workflow;
