use std::path::Path;
use std::sync::Arc;

use super::types::{EmbeddingModel, ProtocolExcerpt, ProtocolRetriever};
use super::RagError;

/// Protocol file extensions picked up by [`InMemoryProtocolIndex::load_dir`].
const PROTOCOL_EXTENSIONS: &[&str] = &["md", "txt"];

/// In-memory protocol index. Uses cosine similarity.
///
/// Built once at startup and then only read, so it can be shared across
/// concurrent cases without locking.
pub struct InMemoryProtocolIndex {
    embedder: Arc<dyn EmbeddingModel>,
    entries: Vec<IndexedExcerpt>,
}

struct IndexedExcerpt {
    excerpt: ProtocolExcerpt,
    embedding: Vec<f32>,
}

impl InMemoryProtocolIndex {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, content: &str, source: &str) -> Result<(), RagError> {
        let embedding = self.embed(content)?;
        self.entries.push(IndexedExcerpt {
            excerpt: ProtocolExcerpt::new(content, source),
            embedding,
        });
        Ok(())
    }

    /// Index every protocol file in `dir`, one excerpt per blank-line
    /// separated paragraph. The source identifier is the file name.
    /// A missing directory yields an empty index.
    pub fn load_dir(dir: &Path, embedder: Arc<dyn EmbeddingModel>) -> Result<Self, RagError> {
        let mut index = Self::new(embedder);
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Protocol directory missing, index is empty");
            return Ok(index);
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PROTOCOL_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();

        for path in &files {
            let text = std::fs::read_to_string(path)?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            for paragraph in split_paragraphs(&text) {
                index.add(&paragraph, &source)?;
            }
        }

        tracing::info!(
            files = files.len(),
            excerpts = index.len(),
            "Protocol index loaded"
        );
        Ok(index)
    }

    /// Embed `text`, rejecting vectors of the wrong width.
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let embedding = self.embedder.embed(text)?;
        let expected = self.embedder.dimension();
        if embedding.len() != expected {
            return Err(RagError::EmbeddingFailed(format!(
                "expected {expected} dimensions, got {}",
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProtocolRetriever for InMemoryProtocolIndex {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ProtocolExcerpt>, RagError> {
        let query_embedding = self.embed(query)?;

        let mut scored: Vec<(f32, &IndexedExcerpt)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_embedding, &entry.embedding), entry))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.excerpt.clone())
            .collect())
    }
}

/// Blank-line separated paragraphs, with CRLF line endings normalised.
fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Deterministic bag-of-words embedder: each lowercase term is hashed
/// (FNV-1a) into one of `dimension` buckets, then the vector is L2-normalised.
/// Good enough for keyword-level protocol lookup without a model download.
#[derive(Debug, Clone, Copy)]
pub struct HashedTermEmbedder {
    dimension: usize,
}

impl HashedTermEmbedder {
    pub const DEFAULT_DIMENSION: usize = 512;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashedTermEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl EmbeddingModel for HashedTermEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vector = vec![0.0f32; self.dimension];
        for term in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&term.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(term: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    term.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
