//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! Collections use cosine similarity; Qdrant's score is converted to a
//! distance as `1 - score`. Title, description and query live in the point
//! payload, and every schema text field gets a full-text payload index.
//! Ties between equal scores are ordered by Qdrant.
//!
//! # Example
//!
//! ```rust,ignore
//! use query_library::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::connect("http://localhost:6334", None, 1536).await?;
//! store.insert_many("queries", &entries).await?;
//! let results = store.query_nearest("queries", &vector, 3).await?;
//! ```

use std::collections::HashMap;

use async_stream::try_stream;
use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType, PointId,
    PointStruct, RetrievedPoint, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;
use uuid::Uuid;

use crate::entry::{CollectionSchema, Entry, SearchResult};
use crate::error::{QueryLibraryError, Result};
use crate::vectorstore::{EntryStream, VectorStore};

const BACKEND: &str = "qdrant";

/// Points fetched per scroll request while iterating a collection.
const SCROLL_PAGE_SIZE: u32 = 64;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Holds one [`qdrant_client::Qdrant`] client for its whole lifetime.
/// Searching a collection that does not exist surfaces Qdrant's error as
/// [`QueryLibraryError::VectorStoreError`].
pub struct QdrantVectorStore {
    client: RwLock<Option<Qdrant>>,
    default_dimensions: usize,
}

impl QdrantVectorStore {
    /// Connect to Qdrant at `url` and verify the server is reachable.
    ///
    /// `default_dimensions` sizes collections whose schema does not set
    /// dimensions and that are created before any vector is seen.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::VectorStoreError`] if the client cannot be
    /// built or the health check fails.
    pub async fn connect(
        url: &str,
        api_key: Option<&str>,
        default_dimensions: usize,
    ) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder.build().map_err(Self::map_err)?;
        client.health_check().await.map_err(Self::map_err)?;
        debug!(url, "connected to qdrant");
        Ok(Self::from_client(client, default_dimensions))
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant, default_dimensions: usize) -> Self {
        Self { client: RwLock::new(Some(client)), default_dimensions }
    }

    fn map_err(e: qdrant_client::QdrantError) -> QueryLibraryError {
        QueryLibraryError::store(BACKEND, e.to_string())
    }

    async fn client(&self) -> Result<RwLockReadGuard<'_, Qdrant>> {
        RwLockReadGuard::try_map(self.client.read().await, Option::as_ref)
            .map_err(|_| QueryLibraryError::closed(BACKEND))
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> String {
        payload.get(key).and_then(Self::extract_string).unwrap_or_default()
    }

    fn point_id_string(id: Option<&PointId>) -> String {
        id.and_then(|pid| match &pid.point_id_options {
            Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
            Some(PointIdOptions::Num(n)) => Some(n.to_string()),
            None => None,
        })
        .unwrap_or_default()
    }

    fn entry_from_point(point: RetrievedPoint) -> Entry {
        let vector = point
            .vectors
            .and_then(|v| v.vectors_options)
            .and_then(|options| match options {
                VectorsOptions::Vector(v) => Some(v.data),
                _ => None,
            })
            .unwrap_or_default();

        Entry {
            title: Self::payload_string(&point.payload, "title"),
            description: Self::payload_string(&point.payload, "description"),
            query: Self::payload_string(&point.payload, "query"),
            vector,
        }
    }

    fn to_point(entry: &Entry) -> Result<PointStruct> {
        let payload = Payload::try_from(serde_json::json!({
            "title": entry.title,
            "description": entry.description,
            "query": entry.query,
        }))
        .map_err(Self::map_err)?;
        Ok(PointStruct::new(Uuid::new_v4().to_string(), entry.vector.clone(), payload))
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.client().await?.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: Option<&CollectionSchema>,
    ) -> Result<()> {
        let schema = schema.cloned().unwrap_or_default();
        schema.validate()?;

        if self.exists(name).await? {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        let dimensions = schema.dimensions.unwrap_or(self.default_dimensions);
        let client = self.client().await?;
        client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        for field in &schema.text_fields {
            client
                .create_field_index(
                    CreateFieldIndexCollectionBuilder::new(name, field.as_str(), FieldType::Text)
                        .wait(true),
                )
                .await
                .map_err(Self::map_err)?;
        }

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.exists(name).await? {
            return Ok(());
        }
        self.client().await?.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn insert_many(&self, collection: &str, entries: &[Entry]) -> Result<()> {
        if !self.exists(collection).await? {
            let dimensions =
                entries.first().map(|e| e.vector.len()).unwrap_or(self.default_dimensions);
            let schema = CollectionSchema::default().with_dimensions(dimensions);
            self.create_collection(collection, Some(&schema)).await?;
        }

        if entries.is_empty() {
            return Ok(());
        }

        let points = entries.iter().map(Self::to_point).collect::<Result<Vec<_>>>()?;

        self.client()
            .await?
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = entries.len(), "inserted entries into qdrant");
        Ok(())
    }

    async fn query_nearest(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client()
            .await?
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| SearchResult {
                id: Self::point_id_string(scored.id.as_ref()),
                title: Self::payload_string(&scored.payload, "title"),
                description: Self::payload_string(&scored.payload, "description"),
                query: Self::payload_string(&scored.payload, "query"),
                distance: Some((1.0 - scored.score).max(0.0)),
            })
            .collect();

        Ok(results)
    }

    fn get_collection_iterator<'a>(&'a self, collection: &'a str) -> EntryStream<'a> {
        Box::pin(try_stream! {
            let mut offset: Option<PointId> = None;
            loop {
                let mut request = ScrollPointsBuilder::new(collection)
                    .limit(SCROLL_PAGE_SIZE)
                    .with_payload(true)
                    .with_vectors(true);
                if let Some(next) = offset.take() {
                    request = request.offset(next);
                }

                let page = {
                    let client = self.client().await?;
                    client.scroll(request).await.map_err(Self::map_err)?
                };

                for point in page.result {
                    yield Self::entry_from_point(point);
                }

                match page.next_page_offset {
                    Some(next) => offset = Some(next),
                    None => break,
                }
            }
        })
    }

    async fn close(&self) {
        if self.client.write().await.take().is_some() {
            debug!(backend = BACKEND, "closed qdrant client");
        }
    }
}
