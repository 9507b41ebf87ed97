//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small catalogues.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::entry::{CollectionSchema, Entry, SearchResult};
use crate::error::{QueryLibraryError, Result};
use crate::vectorstore::{EntryStream, VectorStore};

const BACKEND: &str = "in-memory";

#[derive(Debug)]
struct StoredCollection {
    schema: CollectionSchema,
    /// Entries in insertion order, keyed by their assigned id.
    entries: Vec<(String, Entry)>,
}

/// An in-memory vector store ranking by cosine distance.
///
/// Entries with equal distance keep their insertion order. Querying a
/// collection that does not exist returns
/// [`QueryLibraryError::VectorStoreError`].
///
/// # Example
///
/// ```rust,ignore
/// use query_library::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("queries", None).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, StoredCollection>>,
    closed: AtomicBool,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the schema a collection was created with.
    pub async fn schema(&self, name: &str) -> Option<CollectionSchema> {
        self.collections.read().await.get(name).map(|c| c.schema.clone())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueryLibraryError::closed(BACKEND));
        }
        Ok(())
    }

    fn missing(collection: &str) -> QueryLibraryError {
        QueryLibraryError::store(BACKEND, format!("collection '{collection}' does not exist"))
    }
}

/// Cosine distance: `1 - cosine_similarity`, never below zero.
///
/// A zero-magnitude vector has similarity 0.0 with everything, so its
/// distance is 1.0. Sums are accumulated in `f64` so that components up to
/// `f32::MAX` cannot overflow to infinity. Vectors holding NaN or infinite
/// components get the maximum distance of 2.0.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if !similarity.is_finite() {
        return 2.0;
    }
    (1.0 - similarity).max(0.0) as f32
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: Option<&CollectionSchema>,
    ) -> Result<()> {
        self.ensure_open()?;
        let schema = schema.cloned().unwrap_or_default();
        schema.validate()?;

        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            debug!(collection = name, "collection already exists, skipping creation");
            return Ok(());
        }
        collections.insert(name.to_string(), StoredCollection { schema, entries: Vec::new() });
        debug!(collection = name, "created in-memory collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.ensure_open()?;
        if self.collections.write().await.remove(name).is_some() {
            debug!(collection = name, "deleted in-memory collection");
        }
        Ok(())
    }

    async fn insert_many(&self, collection: &str, entries: &[Entry]) -> Result<()> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_insert_with(|| {
            let mut schema = CollectionSchema::default();
            schema.dimensions = entries.first().map(|e| e.vector.len());
            debug!(collection, "auto-created in-memory collection");
            StoredCollection { schema, entries: Vec::new() }
        });

        stored
            .entries
            .extend(entries.iter().map(|entry| (Uuid::new_v4().to_string(), entry.clone())));

        debug!(collection, count = entries.len(), "inserted entries");
        Ok(())
    }

    async fn query_nearest(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;
        let stored = collections.get(collection).ok_or_else(|| Self::missing(collection))?;

        let mut results: Vec<SearchResult> = stored
            .entries
            .iter()
            .map(|(id, entry)| SearchResult {
                id: id.clone(),
                title: entry.title.clone(),
                description: entry.description.clone(),
                query: entry.query.clone(),
                distance: Some(cosine_distance(&entry.vector, vector)),
            })
            .collect();

        // Stable sort, so equal distances stay in insertion order.
        results.sort_by(|a, b| {
            let key = |r: &SearchResult| r.distance.unwrap_or(f32::INFINITY);
            key(a).total_cmp(&key(b))
        });
        results.truncate(limit);
        Ok(results)
    }

    fn get_collection_iterator<'a>(&'a self, collection: &'a str) -> EntryStream<'a> {
        stream::unfold(Some(0usize), move |cursor| async move {
            let index = cursor?;
            if let Err(e) = self.ensure_open() {
                return Some((Err(e), None));
            }
            let collections = self.collections.read().await;
            match collections.get(collection) {
                None => Some((Err(Self::missing(collection)), None)),
                Some(stored) => {
                    stored.entries.get(index).map(|(_, entry)| (Ok(entry.clone()), Some(index + 1)))
                }
            }
        })
        .boxed()
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.collections.write().await.clear();
        debug!(backend = BACKEND, "closed vector store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = [0.3, -0.7, 0.2];
        assert!(cosine_distance(&v, &v) < 1e-6);
    }

    #[test]
    fn zero_vector_is_unit_distance() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn opposite_vectors_have_distance_two() {
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn huge_components_do_not_overflow() {
        let diagonal = cosine_distance(&[1e20, 1e20], &[1e20, 0.0]);
        assert!((diagonal - (1.0 - std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-6);
        assert!(cosine_distance(&[f32::MAX, f32::MAX], &[f32::MAX, f32::MAX]) < 1e-6);
    }

    #[test]
    fn non_finite_components_are_farthest() {
        assert_eq!(cosine_distance(&[f32::NAN, 1.0], &[1.0, 0.0]), 2.0);
        assert_eq!(cosine_distance(&[f32::INFINITY, 0.0], &[1.0, 0.0]), 2.0);
    }
}
