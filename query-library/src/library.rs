//! Query suggestion pipeline.
//!
//! The [`QueryLibrary`] turns a natural-language purpose into a ranked list
//! of catalogued example queries by composing an [`EmbeddingProvider`] with a
//! [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use query_library::{QueryLibrary, QueryLibraryConfig, InMemoryVectorStore};
//!
//! let library = QueryLibrary::builder()
//!     .config(QueryLibraryConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! library.populate(&examples).await?;
//! let response = library.get_query_suggestions("count of subscriptions", &["count"]).await;
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::QueryLibraryConfig;
use crate::embedding::EmbeddingProvider;
use crate::entry::{CollectionSchema, Entry, QueryExample};
use crate::error::{QueryLibraryError, Result};
use crate::response::{DashboardQuery, QuerySuggestionResponse};
use crate::vectorstore::VectorStore;

/// Retrieval pipeline over a catalogue of example queries.
///
/// Each call to [`get_query_suggestions`](QueryLibrary::get_query_suggestions)
/// runs embed → check collection → search → format independently; the only
/// state shared between calls is the vector store connection. Construct one
/// via [`QueryLibrary::builder()`].
pub struct QueryLibrary {
    config: QueryLibraryConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl QueryLibrary {
    /// Create a new [`QueryLibraryBuilder`].
    pub fn builder() -> QueryLibraryBuilder {
        QueryLibraryBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &QueryLibraryConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Suggest catalogued queries matching `purpose`.
    ///
    /// Never fails: a missing collection, an embedding or search error, and
    /// even a panicking collaborator all come back as
    /// [`QuerySuggestionResponse::Failure`]. Results are ordered by ascending
    /// distance and capped at the configured limit.
    ///
    /// `keywords` are logged with the request but do not influence ranking;
    /// only the embedding of `purpose` does.
    pub async fn get_query_suggestions(
        &self,
        purpose: &str,
        keywords: &[&str],
    ) -> QuerySuggestionResponse {
        info!(
            purpose,
            keywords = %keywords.join(", "),
            collection = %self.config.collection_name,
            "searching for matching queries"
        );

        match AssertUnwindSafe(self.suggest(purpose)).catch_unwind().await {
            Ok(Ok(queries)) => {
                info!(result_count = queries.len(), "query suggestions ready");
                QuerySuggestionResponse::success(queries)
            }
            Ok(Err(e @ QueryLibraryError::CollectionMissing(_))) => {
                warn!(error = %e, "query library is not populated");
                QuerySuggestionResponse::failure(e.to_string())
            }
            Ok(Err(e)) => {
                error!(error = %e, "error while searching for queries");
                QuerySuggestionResponse::failure(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(error = %message, "query suggestion panicked");
                QuerySuggestionResponse::failure(format!("query suggestion panicked: {message}"))
            }
        }
    }

    async fn suggest(&self, purpose: &str) -> Result<Vec<DashboardQuery>> {
        let collection = self.config.collection_name.as_str();

        // 1. Embed the purpose; the first vector is the query vector.
        let vector = self.embedding_provider.embed(purpose).await?.into_iter().next().ok_or_else(
            || QueryLibraryError::PipelineError("embedding provider returned no vectors".into()),
        )?;

        // 2. Refuse to search a collection that was never populated.
        if !self.vector_store.exists(collection).await? {
            return Err(QueryLibraryError::CollectionMissing(collection.to_string()));
        }

        // 3. Nearest-neighbor search
        let results = self.vector_store.query_nearest(collection, &vector, self.config.limit).await?;

        // 4. Shape into dashboard queries
        let queries = results
            .into_iter()
            .map(|result| {
                info!(
                    title = %result.title,
                    description = %result.description,
                    distance = ?result.distance,
                    "found query candidate"
                );
                DashboardQuery::from(result)
            })
            .collect();

        Ok(queries)
    }

    /// Create the configured collection sized to the embedding provider.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::PipelineError`] if the vector store operation fails.
    pub async fn create_collection(&self) -> Result<()> {
        let name = self.config.collection_name.as_str();
        let schema = CollectionSchema::default().with_dimensions(self.embedding_provider.dimensions());
        self.vector_store.create_collection(name, Some(&schema)).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            QueryLibraryError::PipelineError(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Delete the configured collection.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::PipelineError`] if the vector store operation fails.
    pub async fn delete_collection(&self) -> Result<()> {
        let name = self.config.collection_name.as_str();
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            QueryLibraryError::PipelineError(format!("failed to delete collection '{name}': {e}"))
        })
    }

    /// Embed and store catalogued examples in the configured collection,
    /// creating it if needed. Returns the number of entries inserted.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::PipelineError`] if embedding or insertion
    /// fails. Insertion is not atomic; a failure may leave part of the batch
    /// stored.
    pub async fn populate(&self, examples: &[QueryExample]) -> Result<usize> {
        let collection = self.config.collection_name.as_str();
        if examples.is_empty() {
            info!(collection, entry_count = 0, "nothing to populate");
            return Ok(0);
        }

        let texts: Vec<String> = examples.iter().map(QueryExample::embedding_text).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let vectors = self.embedding_provider.embed_batch(&text_refs).await.map_err(|e| {
            error!(collection, error = %e, "embedding failed while populating");
            QueryLibraryError::PipelineError(format!("embedding failed while populating: {e}"))
        })?;
        if vectors.len() != examples.len() {
            return Err(QueryLibraryError::PipelineError(format!(
                "embedding provider returned {} vectors for {} examples",
                vectors.len(),
                examples.len()
            )));
        }

        let entries: Vec<Entry> = examples
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(example, vector)| example.into_entry(vector))
            .collect();

        self.vector_store.insert_many(collection, &entries).await.map_err(|e| {
            error!(collection, error = %e, "insert failed while populating");
            QueryLibraryError::PipelineError(format!(
                "insert failed in collection '{collection}': {e}"
            ))
        })?;

        info!(collection, entry_count = entries.len(), "populated query library");
        Ok(entries.len())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for constructing a [`QueryLibrary`].
///
/// `embedding_provider` and `vector_store` are required; `config` defaults to
/// [`QueryLibraryConfig::default()`].
///
/// # Example
///
/// ```rust,ignore
/// let library = QueryLibrary::builder()
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(backend::connect(&StoreConfig::from_env()?).await?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct QueryLibraryBuilder {
    config: Option<QueryLibraryConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl QueryLibraryBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: QueryLibraryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Build the [`QueryLibrary`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<QueryLibrary> {
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            QueryLibraryError::ConfigError("embedding_provider is required".to_string())
        })?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| QueryLibraryError::ConfigError("vector_store is required".to_string()))?;

        Ok(QueryLibrary { config: self.config.unwrap_or_default(), embedding_provider, vector_store })
    }
}
