//! # Populate Library Example
//!
//! Loads a JSON catalogue of example queries, embeds it with an Azure OpenAI
//! deployment and stores it in the configured vector store, then runs one
//! suggestion request against it.
//!
//! Requires `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME`
//! and `AZURE_OPENAI_API_KEY`. Pick a persistent store with `VECTOR_STORE`
//! (plus the `qdrant` or `pgvector` feature).
//!
//! Run: `cargo run --example populate_library --features openai,qdrant -- catalogue.json "count of subscriptions"`

use std::sync::Arc;

use anyhow::Context;
use futures::TryStreamExt;
use query_library::openai::OpenAIEmbeddingProvider;
use query_library::{QueryExample, QueryLibrary, QueryLibraryConfig, StoreConfig, backend};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let catalogue = args.next().context("usage: populate_library <catalogue.json> [purpose]")?;
    let purpose = args.next().unwrap_or_else(|| "count of subscriptions".to_string());

    let config = QueryLibraryConfig::from_env()?;
    let store = backend::connect(&StoreConfig::from_env()?).await?;
    let library = QueryLibrary::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(OpenAIEmbeddingProvider::azure_from_env()?))
        .vector_store(store.clone())
        .build()?;

    let json = std::fs::read_to_string(&catalogue)
        .with_context(|| format!("failed to read catalogue '{catalogue}'"))?;
    let examples = QueryExample::from_json(&json)?;

    library.create_collection().await?;
    let inserted = library.populate(&examples).await?;
    info!(inserted, collection = %config.collection_name, "catalogue stored");

    let stored: Vec<_> =
        store.get_collection_iterator(&config.collection_name).try_collect().await?;
    println!("Collection '{}' now holds {} entries.", config.collection_name, stored.len());

    let response = library.get_query_suggestions(&purpose, &[]).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    store.close().await;
    Ok(())
}
