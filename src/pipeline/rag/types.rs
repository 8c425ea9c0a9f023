use serde::{Deserialize, Serialize};

use super::RagError;

/// A protocol text fragment returned by retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolExcerpt {
    pub content: String,
    /// Identifier of the protocol document the excerpt came from.
    pub source: String,
}

impl ProtocolExcerpt {
    pub fn new(content: &str, source: &str) -> Self {
        Self {
            content: content.to_string(),
            source: source.to_string(),
        }
    }
}

/// Fixed decoding parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 240,
            temperature: 0.7,
        }
    }
}

/// Top-k protocol search. Results are ordered most relevant first and the
/// index is never mutated by a query.
pub trait ProtocolRetriever: Send + Sync {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ProtocolExcerpt>, RagError>;
}

/// Text generation. Output is non-deterministic across calls.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, RagError>;
}

/// Text to dense vector.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
    fn dimension(&self) -> usize;
}
