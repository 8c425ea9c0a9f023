//! Exclusive-access adapters for collaborators that cannot be invoked
//! concurrently (e.g. a model runtime holding a mutable session).
//!
//! Such collaborators implement the `&mut self` traits below and are wrapped
//! in [`Serialized`], which satisfies the shared `ProtocolRetriever` /
//! `TextGenerator` traits by taking a lock for the duration of each call.

use std::sync::Mutex;

use super::types::{GenerationParams, ProtocolExcerpt, ProtocolRetriever, TextGenerator};
use super::RagError;

/// A generator that needs exclusive access per call.
pub trait ExclusiveGenerator: Send {
    fn generate_exclusive(
        &mut self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, RagError>;
}

/// A retriever that needs exclusive access per call.
pub trait ExclusiveRetriever: Send {
    fn retrieve_exclusive(&mut self, query: &str, k: usize)
        -> Result<Vec<ProtocolExcerpt>, RagError>;
}

/// Mutex-guarded collaborator. One call at a time; callers block.
pub struct Serialized<T> {
    inner: Mutex<T>,
}

impl<T> Serialized<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> Result<T, RagError> {
        self.inner.into_inner().map_err(|_| RagError::Poisoned)
    }
}

impl<T: ExclusiveGenerator> TextGenerator for Serialized<T> {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, RagError> {
        let mut guard = self.inner.lock().map_err(|_| RagError::Poisoned)?;
        guard.generate_exclusive(prompt, params)
    }
}

impl<T: ExclusiveRetriever> ProtocolRetriever for Serialized<T> {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ProtocolExcerpt>, RagError> {
        let mut guard = self.inner.lock().map_err(|_| RagError::Poisoned)?;
        guard.retrieve_exclusive(query, k)
    }
}
