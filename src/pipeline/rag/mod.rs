//! Retrieval-augmented answer synthesis over internal protocol excerpts.
//!
//! Retrieval and generation are external collaborators behind the traits in
//! [`types`]; [`orchestrator::AnswerSynthesizer`] sequences them, guards the
//! output and records the synthesis audit event.

pub mod context;
pub mod ollama;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod serialized;
pub mod types;

use thiserror::Error;

use crate::audit::AuditError;

pub use ollama::OllamaGenerator;
pub use orchestrator::{AnswerSynthesizer, Synthesis, SynthesisSettings};
pub use retrieval::{HashedTermEmbedder, InMemoryProtocolIndex};
pub use serialized::{ExclusiveGenerator, ExclusiveRetriever, Serialized};
pub use types::{EmbeddingModel, GenerationParams, ProtocolExcerpt, ProtocolRetriever, TextGenerator};

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Ollama connection failed: {0}")]
    OllamaConnection(String),

    #[error("Ollama returned HTTP {status}: {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Collaborator call exceeded {secs}s")]
    Timeout { secs: u64 },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Protocol retrieval failed: {0}")]
    Retrieval(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Protocol index could not be read: {0}")]
    IndexRead(#[from] std::io::Error),

    #[error("Collaborator lock poisoned")]
    Poisoned,

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),
}
