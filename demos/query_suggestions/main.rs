//! # Query Suggestions Example
//!
//! Populates a query library from a small catalogue and asks it for
//! suggestions.
//!
//! Uses the deterministic bag-of-words `MockEmbeddingProvider` so it runs with
//! **zero API keys**. The store comes from `StoreConfig::from_env()`, which
//! defaults to the in-memory backend.
//!
//! Run: `cargo run --example query_suggestions`

use std::sync::Arc;

use query_library::{QueryExample, QueryLibrary, QueryLibraryConfig, StoreConfig, backend};
use query_library_demos::MockEmbeddingProvider;

const DIMENSIONS: usize = 64;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Connect the configured store (in-memory unless VECTOR_STORE says otherwise)
    let store = backend::connect(&StoreConfig::from_env()?).await?;

    // -- 2. Build the library ---------------------------------------------
    let library = QueryLibrary::builder()
        .config(QueryLibraryConfig::builder().collection_name("demo_queries").limit(2).build()?)
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIMENSIONS)))
        .vector_store(store.clone())
        .build()?;

    // -- 3. Asking before populating reports the missing collection -------
    let response = library.get_query_suggestions("count of subscriptions", &["count"]).await;
    println!("Before populating:\n{}\n", serde_json::to_string_pretty(&response)?);

    // -- 4. Populate from the bundled catalogue ---------------------------
    let examples = QueryExample::from_json(include_str!("queries.json"))?;
    let inserted = library.populate(&examples).await?;
    println!("Populated {inserted} example queries.\n");

    // -- 5. Ask for suggestions -------------------------------------------
    let requests: [(&str, &[&str]); 3] = [
        ("count of subscriptions", &["subscriptions", "count"]),
        ("virtual machines per region", &["virtual machines", "location"]),
        ("right-size recommendations for my virtual machines", &["advisor"]),
    ];

    for (purpose, keywords) in requests {
        println!("Purpose: \"{purpose}\"");
        let response = library.get_query_suggestions(purpose, keywords).await;
        if let Some(error) = response.error() {
            println!("  error: {error}");
        }
        for (i, query) in response.queries().iter().enumerate() {
            println!("  {}. {} - {}", i + 1, query.title, query.query);
        }
        println!();
    }

    // -- 6. Clean up ------------------------------------------------------
    library.delete_collection().await?;
    store.close().await;
    println!("Done.");
    Ok(())
}
