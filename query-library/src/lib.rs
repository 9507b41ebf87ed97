//! # query-library
//!
//! Suggests previously catalogued example queries from a natural-language
//! description of intent, backed by a pluggable vector store.
//!
//! ## Overview
//!
//! - [`VectorStore`]: storage-agnostic collection lifecycle, bulk insertion,
//!   nearest-neighbor search and lazy iteration
//! - [`EmbeddingProvider`]: the text-to-vector service the pipeline consumes
//! - [`QueryLibrary`]: embed → check collection → search → format, returning
//!   a [`QuerySuggestionResponse`] that never carries an error past its boundary
//!
//! ## Backends
//!
//! | Backend | Feature | Module |
//! |---|---|---|
//! | In-memory | always | [`inmemory`] |
//! | Qdrant | `qdrant` | `qdrant` |
//! | PostgreSQL + pgvector | `pgvector` | `pgvector` |
//!
//! The OpenAI / Azure OpenAI embedding provider lives in `openai`
//! behind the `openai` feature. [`backend::connect`] picks a store from a
//! [`StoreConfig`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use query_library::{InMemoryVectorStore, QueryLibrary};
//!
//! let library = QueryLibrary::builder()
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! library.populate(&examples).await?;
//! let response = library.get_query_suggestions("count of subscriptions", &["count"]).await;
//! for query in response.queries() {
//!     println!("{}: {}", query.title, query.query);
//! }
//! ```

pub mod backend;
pub mod config;
pub mod embedding;
pub mod entry;
pub mod error;
pub mod inmemory;
pub mod library;
pub mod response;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use config::{DEFAULT_COLLECTION, QueryLibraryConfig, QueryLibraryConfigBuilder, StoreConfig};
pub use embedding::EmbeddingProvider;
pub use entry::{
    CORE_FIELDS, CollectionSchema, Entry, QueryExample, RESERVED_FIELDS, SearchResult,
};
pub use error::{QueryLibraryError, Result};
pub use inmemory::InMemoryVectorStore;
pub use library::{QueryLibrary, QueryLibraryBuilder};
pub use response::{DashboardQuery, QuerySuggestionResponse};
pub use vectorstore::{DEFAULT_LIMIT, EntryStream, VectorStore};
