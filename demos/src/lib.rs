//! Shared helpers for the query library demos.

use query_library::EmbeddingProvider;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider: hashed bag-of-words embeddings for demos
// ---------------------------------------------------------------------------

/// Deterministic embeddings that need no API keys.
///
/// Each lowercase word lands in a bucket chosen by its hash, so texts
/// sharing words point in similar directions.
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> query_library::Result<Vec<Vec<f32>>> {
        let mut emb = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100000001b3));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        // L2-normalise so cosine distance only depends on direction.
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vec![emb])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
