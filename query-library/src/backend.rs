//! Vector store construction from a [`StoreConfig`].

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::VectorStore;

/// Connect to the backend selected by `config`.
///
/// The connection is established here, so an unreachable backend fails at
/// construction rather than on first use.
///
/// # Example
///
/// ```rust,ignore
/// use query_library::{StoreConfig, backend};
///
/// let store = backend::connect(&StoreConfig::from_env()?).await?;
/// ```
///
/// # Errors
///
/// Returns [`QueryLibraryError::VectorStoreError`](crate::QueryLibraryError::VectorStoreError)
/// if the backend cannot be reached.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config {
        StoreConfig::InMemory => Arc::new(InMemoryVectorStore::new()),
        #[cfg(feature = "qdrant")]
        StoreConfig::Qdrant { url, api_key, dimensions } => Arc::new(
            crate::qdrant::QdrantVectorStore::connect(url, api_key.as_deref(), *dimensions).await?,
        ),
        #[cfg(feature = "pgvector")]
        StoreConfig::Pgvector { database_url, dimensions, max_connections } => Arc::new(
            crate::pgvector::PgVectorStore::connect(database_url, *dimensions, *max_connections)
                .await?,
        ),
    };
    info!(backend = config.backend_name(), "vector store connected");
    Ok(store)
}
