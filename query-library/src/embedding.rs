//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::{QueryLibraryError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap an external embedding service. [`embed`](EmbeddingProvider::embed)
/// returns a sequence of vectors for one text; consumers that need a single
/// vector use the first one. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// calls `embed` sequentially and keeps the first vector of each response;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use query_library::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let vectors = provider.embed("count of subscriptions").await?;
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding vectors for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<Vec<f32>>>;

    /// Generate one embedding vector per text input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let vector = self.embed(text).await?.into_iter().next().ok_or_else(|| {
                QueryLibraryError::EmbeddingError {
                    provider: "batch".to_string(),
                    message: "provider returned no vectors".to_string(),
                }
            })?;
            results.push(vector);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
