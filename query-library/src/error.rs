//! Error types for the `query-library` crate.

use thiserror::Error;

/// Errors that can occur in query library operations.
#[derive(Debug, Error)]
pub enum QueryLibraryError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The collection has not been created or populated yet.
    #[error(
        "Collection '{0}' does not exist, please make sure to populate it with query examples."
    )]
    CollectionMissing(String),

    /// The store's connection was released by [`close`](crate::VectorStore::close).
    #[error("Vector store ({backend}) is closed")]
    StoreClosed {
        /// The vector store backend that was closed.
        backend: String,
    },

    /// A collection schema failed validation.
    #[error("Invalid collection schema: {0}")]
    InvalidSchema(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl QueryLibraryError {
    pub(crate) fn store(backend: &str, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.to_string(), message: message.into() }
    }

    pub(crate) fn closed(backend: &str) -> Self {
        Self::StoreClosed { backend: backend.to_string() }
    }
}

/// A convenience result type for query library operations.
pub type Result<T> = std::result::Result<T, QueryLibraryError>;
