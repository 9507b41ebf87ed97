//! Vector store trait for collection lifecycle and similarity search.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::entry::{CollectionSchema, Entry, SearchResult};
use crate::error::Result;

/// Default number of results returned by [`VectorStore::query_nearest`].
pub const DEFAULT_LIMIT: usize = 3;

/// A lazy, finite sequence of the entries in a collection.
pub type EntryStream<'a> = BoxStream<'a, Result<Entry>>;

/// A storage backend for example queries and their vectors.
///
/// Implementations manage named collections of [`Entry`]s. Read operations
/// (`exists`, `query_nearest`, `get_collection_iterator`) are safe to call
/// concurrently through a shared reference. Schema-mutating operations
/// (`create_collection`, `delete_collection`, `insert_many`) are not
/// synchronized against concurrent searches; callers serialize them.
///
/// Vectors are never derived by the store. Dimensionality mismatches between
/// an entry or query vector and its collection are the caller's
/// responsibility.
///
/// # Example
///
/// ```rust,ignore
/// use query_library::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.insert_many("queries", &entries).await?;
/// let results = store.query_nearest("queries", &vector, 3).await?;
/// store.close().await;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Return whether the named collection exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Create a named collection. No-op if it already exists.
    ///
    /// With `schema` omitted, [`CollectionSchema::default`] is used.
    async fn create_collection(&self, name: &str, schema: Option<&CollectionSchema>)
    -> Result<()>;

    /// Delete a named collection and all its entries. No-op if it is absent.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert entries, auto-creating the collection with the default schema
    /// if it does not exist.
    ///
    /// The batch is not guaranteed to be atomic: an implementation may report
    /// a single failure for the whole batch after some entries were written.
    async fn insert_many(&self, collection: &str, entries: &[Entry]) -> Result<()>;

    /// Return up to `limit` entries nearest to `vector`, ordered by ascending
    /// distance. An empty collection yields an empty `Vec`.
    ///
    /// Behavior for a missing collection is backend-specific; check
    /// [`exists`](VectorStore::exists) first.
    async fn query_nearest(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Stream every entry in a collection without materializing it.
    ///
    /// Each call starts a fresh pass. Errors, including a missing collection,
    /// are yielded as stream items.
    fn get_collection_iterator<'a>(&'a self, collection: &'a str) -> EntryStream<'a>;

    /// Release the underlying connection.
    ///
    /// Safe to call more than once. Failures during release are logged and
    /// swallowed. Other operations return
    /// [`StoreClosed`](crate::QueryLibraryError::StoreClosed) afterwards.
    async fn close(&self);
}
