//! Pipeline tests for `QueryLibrary::get_query_suggestions` and `populate`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use query_library::{
    CollectionSchema, EmbeddingProvider, Entry, EntryStream, InMemoryVectorStore, QueryExample,
    QueryLibrary, QueryLibraryConfig, QueryLibraryError, QuerySuggestionResponse, SearchResult,
    VectorStore,
};

/// Returns a fixed vector per known text and `[0, 0]` otherwise.
struct FixedEmbeddingProvider {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl FixedEmbeddingProvider {
    fn new(pairs: &[(&str, [f32; 2])]) -> Self {
        Self {
            vectors: pairs.iter().map(|(t, v)| (t.to_string(), v.to_vec())).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbeddingProvider {
    async fn embed(&self, text: &str) -> query_library::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.vectors.get(text).cloned().unwrap_or_else(|| vec![0.0, 0.0])])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> query_library::Result<Vec<Vec<f32>>> {
        Err(QueryLibraryError::EmbeddingError {
            provider: "test".into(),
            message: "service unavailable".into(),
        })
    }

    fn dimensions(&self) -> usize {
        2
    }
}

struct EmptyEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for EmptyEmbeddingProvider {
    async fn embed(&self, _text: &str) -> query_library::Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

struct PanickingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for PanickingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> query_library::Result<Vec<Vec<f32>>> {
        panic!("embedding backend exploded")
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Delegates to an in-memory store but fails every search.
#[derive(Default)]
struct SearchFailingStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for SearchFailingStore {
    fn backend(&self) -> &str {
        "search-failing"
    }

    async fn exists(&self, name: &str) -> query_library::Result<bool> {
        self.inner.exists(name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: Option<&CollectionSchema>,
    ) -> query_library::Result<()> {
        self.inner.create_collection(name, schema).await
    }

    async fn delete_collection(&self, name: &str) -> query_library::Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn insert_many(&self, collection: &str, entries: &[Entry]) -> query_library::Result<()> {
        self.inner.insert_many(collection, entries).await
    }

    async fn query_nearest(
        &self,
        _collection: &str,
        _vector: &[f32],
        _limit: usize,
    ) -> query_library::Result<Vec<SearchResult>> {
        Err(QueryLibraryError::VectorStoreError {
            backend: "search-failing".into(),
            message: "connection reset".into(),
        })
    }

    fn get_collection_iterator<'a>(&'a self, collection: &'a str) -> EntryStream<'a> {
        self.inner.get_collection_iterator(collection)
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

fn example(title: &str) -> QueryExample {
    QueryExample {
        title: title.to_string(),
        description: format!("{title} resources"),
        query: format!("resources | where type == '{title}'"),
    }
}

fn compass_embedder() -> FixedEmbeddingProvider {
    FixedEmbeddingProvider::new(&[
        ("east\neast resources", [1.0, 0.0]),
        ("north\nnorth resources", [0.0, 1.0]),
        ("north-east\nnorth-east resources", [1.0, 1.0]),
        ("west\nwest resources", [-1.0, 0.0]),
        ("south\nsouth resources", [0.0, -1.0]),
        ("mostly east", [0.9, 0.1]),
    ])
}

fn compass_examples() -> Vec<QueryExample> {
    ["east", "north", "north-east", "west", "south"].into_iter().map(example).collect()
}

fn library(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    limit: usize,
) -> QueryLibrary {
    QueryLibrary::builder()
        .config(QueryLibraryConfig::builder().limit(limit).build().unwrap())
        .embedding_provider(embedder)
        .vector_store(store)
        .build()
        .unwrap()
}

#[tokio::test]
async fn suggestions_are_ranked_by_distance() {
    let library = library(Arc::new(compass_embedder()), Arc::new(InMemoryVectorStore::new()), 2);
    assert_eq!(library.populate(&compass_examples()).await.unwrap(), 5);

    let response = library.get_query_suggestions("mostly east", &["east"]).await;

    assert!(response.is_success());
    let titles: Vec<&str> = response.queries().iter().map(|q| q.title.as_str()).collect();
    assert_eq!(titles, vec!["east", "north-east"]);
    assert_eq!(response.queries()[0].query, "resources | where type == 'east'");
    assert!(response.queries().iter().all(|q| !q.id.is_empty()));
}

#[tokio::test]
async fn default_limit_is_three() {
    let library = QueryLibrary::builder()
        .embedding_provider(Arc::new(compass_embedder()))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();
    library.populate(&compass_examples()).await.unwrap();

    let response = library.get_query_suggestions("mostly east", &[]).await;
    assert_eq!(response.queries().len(), 3);
}

#[tokio::test]
async fn missing_collection_is_reported_not_raised() {
    let library = library(Arc::new(compass_embedder()), Arc::new(InMemoryVectorStore::new()), 3);

    let response = library.get_query_suggestions("mostly east", &["east"]).await;

    match response {
        QuerySuggestionResponse::Failure { error, queries } => {
            assert!(error.contains("'queries' does not exist"), "unexpected error: {error}");
            assert!(queries.is_empty());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_collection_yields_empty_success() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("queries", None).await.unwrap();
    let library = library(Arc::new(compass_embedder()), store, 3);

    let response = library.get_query_suggestions("mostly east", &[]).await;
    assert_eq!(response, QuerySuggestionResponse::success(Vec::new()));
}

#[tokio::test]
async fn embedding_failure_becomes_failure_response() {
    let library =
        library(Arc::new(FailingEmbeddingProvider), Arc::new(InMemoryVectorStore::new()), 3);

    let response = library.get_query_suggestions("anything", &[]).await;
    let error = response.error().unwrap();
    assert!(error.contains("service unavailable"));
    assert!(response.queries().is_empty());
}

#[tokio::test]
async fn empty_embedding_becomes_failure_response() {
    let library = library(Arc::new(EmptyEmbeddingProvider), Arc::new(InMemoryVectorStore::new()), 3);

    let response = library.get_query_suggestions("anything", &[]).await;
    assert!(response.error().unwrap().contains("no vectors"));
}

#[tokio::test]
async fn search_failure_becomes_failure_response() {
    let store = Arc::new(SearchFailingStore::default());
    store.create_collection("queries", None).await.unwrap();
    let library = library(Arc::new(compass_embedder()), store, 3);

    let response = library.get_query_suggestions("mostly east", &[]).await;
    assert!(response.error().unwrap().contains("connection reset"));
    assert!(response.queries().is_empty());
}

#[tokio::test]
async fn panicking_collaborator_is_contained() {
    let library =
        library(Arc::new(PanickingEmbeddingProvider), Arc::new(InMemoryVectorStore::new()), 3);

    let response = library.get_query_suggestions("anything", &[]).await;
    assert!(response.error().unwrap().contains("embedding backend exploded"));
}

#[tokio::test]
async fn keywords_do_not_change_ranking() {
    let library = library(Arc::new(compass_embedder()), Arc::new(InMemoryVectorStore::new()), 5);
    library.populate(&compass_examples()).await.unwrap();

    let plain = library.get_query_suggestions("mostly east", &[]).await;
    let with_keywords = library.get_query_suggestions("mostly east", &["west", "south"]).await;

    let titles = |r: &QuerySuggestionResponse| {
        r.queries().iter().map(|q| q.title.clone()).collect::<Vec<_>>()
    };
    assert_eq!(titles(&plain), titles(&with_keywords));
}

#[tokio::test]
async fn populate_embeds_title_and_description() {
    let embedder = Arc::new(compass_embedder());
    let store = Arc::new(InMemoryVectorStore::new());
    let library = library(embedder.clone(), store.clone(), 3);

    library.populate(&compass_examples()).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
    let stored: Vec<Entry> = store.get_collection_iterator("queries").try_collect().await.unwrap();
    assert_eq!(stored.len(), 5);
    assert_eq!(stored[2].title, "north-east");
    assert_eq!(stored[2].vector, vec![1.0, 1.0]);
}

#[tokio::test]
async fn populate_with_nothing_is_a_no_op() {
    let store = Arc::new(InMemoryVectorStore::new());
    let library = library(Arc::new(compass_embedder()), store.clone(), 3);

    assert_eq!(library.populate(&[]).await.unwrap(), 0);
    assert!(!store.exists("queries").await.unwrap());
}

#[tokio::test]
async fn populate_surfaces_embedding_failure() {
    let library =
        library(Arc::new(FailingEmbeddingProvider), Arc::new(InMemoryVectorStore::new()), 3);

    let err = library.populate(&compass_examples()).await.unwrap_err();
    assert!(matches!(err, QueryLibraryError::PipelineError(_)));
}

#[tokio::test]
async fn create_and_delete_manage_the_configured_collection() {
    let store = Arc::new(InMemoryVectorStore::new());
    let library = library(Arc::new(compass_embedder()), store.clone(), 3);

    library.create_collection().await.unwrap();
    assert_eq!(store.schema("queries").await.unwrap().dimensions, Some(2));

    library.delete_collection().await.unwrap();
    assert!(!store.exists("queries").await.unwrap());
}

#[test]
fn builder_requires_collaborators() {
    let err = QueryLibrary::builder().build().err().unwrap();
    assert!(matches!(err, QueryLibraryError::ConfigError(_)));

    let err = QueryLibrary::builder()
        .embedding_provider(Arc::new(compass_embedder()))
        .build()
        .err()
        .unwrap();
    assert!(err.to_string().contains("vector_store"));
}
