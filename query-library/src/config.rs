//! Configuration for the query library and its vector store backend.

use serde::{Deserialize, Serialize};

use crate::error::{QueryLibraryError, Result};
use crate::vectorstore::DEFAULT_LIMIT;

/// Collection searched when none is configured.
pub const DEFAULT_COLLECTION: &str = "queries";

/// Configuration parameters for [`QueryLibrary`](crate::QueryLibrary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLibraryConfig {
    /// Collection holding the catalogued example queries.
    pub collection_name: String,
    /// Number of suggestions returned per request.
    pub limit: usize,
}

impl Default for QueryLibraryConfig {
    fn default() -> Self {
        Self { collection_name: DEFAULT_COLLECTION.to_string(), limit: DEFAULT_LIMIT }
    }
}

impl QueryLibraryConfig {
    /// Create a new builder for constructing a [`QueryLibraryConfig`].
    pub fn builder() -> QueryLibraryConfigBuilder {
        QueryLibraryConfigBuilder::default()
    }

    /// Build a config from `QUERY_LIBRARY_COLLECTION` and `QUERY_LIBRARY_LIMIT`,
    /// keeping the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::ConfigError`] if a variable is malformed or
    /// the resulting config is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(name) = lookup("QUERY_LIBRARY_COLLECTION") {
            builder = builder.collection_name(name);
        }
        if let Some(limit) = lookup("QUERY_LIBRARY_LIMIT") {
            let limit = limit.trim().parse::<usize>().map_err(|e| {
                QueryLibraryError::ConfigError(format!("QUERY_LIBRARY_LIMIT '{limit}': {e}"))
            })?;
            builder = builder.limit(limit);
        }
        builder.build()
    }
}

/// Builder for constructing a validated [`QueryLibraryConfig`].
#[derive(Debug, Clone, Default)]
pub struct QueryLibraryConfigBuilder {
    config: QueryLibraryConfig,
}

impl QueryLibraryConfigBuilder {
    /// Set the collection to search.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the number of suggestions returned per request.
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Build the [`QueryLibraryConfig`], validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::ConfigError`] if:
    /// - `collection_name` is empty or whitespace
    /// - `limit == 0`
    pub fn build(self) -> Result<QueryLibraryConfig> {
        if self.config.collection_name.trim().is_empty() {
            return Err(QueryLibraryError::ConfigError(
                "collection_name must not be empty".to_string(),
            ));
        }
        if self.config.limit == 0 {
            return Err(QueryLibraryError::ConfigError("limit must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Which vector store backend to connect to, and how.
///
/// Serialized with a `backend` tag, e.g.
/// `{"backend": "qdrant", "url": "http://localhost:6334", "dimensions": 1536}`.
/// Backends other than `in_memory` require their cargo feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// [`InMemoryVectorStore`](crate::InMemoryVectorStore).
    #[default]
    InMemory,

    /// [`QdrantVectorStore`](crate::qdrant::QdrantVectorStore).
    #[cfg(feature = "qdrant")]
    Qdrant {
        /// gRPC URL, e.g. `http://localhost:6334`.
        url: String,
        /// API key for Qdrant Cloud or secured deployments.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Dimensionality used for collections created before any vector is seen.
        dimensions: usize,
    },

    /// [`PgVectorStore`](crate::pgvector::PgVectorStore).
    #[cfg(feature = "pgvector")]
    Pgvector {
        /// PostgreSQL connection URL.
        database_url: String,
        /// Dimensionality used for collections created before any vector is seen.
        dimensions: usize,
        /// Pool size.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

#[cfg(feature = "pgvector")]
fn default_max_connections() -> u32 {
    5
}

impl StoreConfig {
    /// Build a store config from the environment.
    ///
    /// `VECTOR_STORE` selects the backend (`in_memory` when unset). Qdrant
    /// reads `QDRANT_URL`, `QDRANT_API_KEY` and `EMBEDDING_DIMENSIONS`;
    /// pgvector reads `DATABASE_URL` and `EMBEDDING_DIMENSIONS`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::ConfigError`] for an unknown or disabled
    /// backend, or a missing or malformed required variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = lookup("VECTOR_STORE").unwrap_or_else(|| "in_memory".to_string());
        match backend.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            #[cfg(feature = "qdrant")]
            "qdrant" => Ok(Self::Qdrant {
                url: required(&lookup, "QDRANT_URL")?,
                api_key: lookup("QDRANT_API_KEY"),
                dimensions: dimensions(&lookup)?,
            }),
            #[cfg(feature = "pgvector")]
            "pgvector" => Ok(Self::Pgvector {
                database_url: required(&lookup, "DATABASE_URL")?,
                dimensions: dimensions(&lookup)?,
                max_connections: default_max_connections(),
            }),
            other => Err(QueryLibraryError::ConfigError(format!(
                "unknown or disabled vector store backend '{other}'"
            ))),
        }
    }

    /// Short name of the selected backend.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::InMemory => "in-memory",
            #[cfg(feature = "qdrant")]
            Self::Qdrant { .. } => "qdrant",
            #[cfg(feature = "pgvector")]
            Self::Pgvector { .. } => "pgvector",
        }
    }
}

#[cfg(any(feature = "qdrant", feature = "pgvector"))]
fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| QueryLibraryError::ConfigError(format!("{key} is required")))
}

#[cfg(any(feature = "qdrant", feature = "pgvector"))]
fn dimensions(lookup: &impl Fn(&str) -> Option<String>) -> Result<usize> {
    let raw = required(lookup, "EMBEDDING_DIMENSIONS")?;
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(QueryLibraryError::ConfigError(
            "EMBEDDING_DIMENSIONS must be greater than zero".to_string(),
        )),
        Ok(d) => Ok(d),
        Err(e) => Err(QueryLibraryError::ConfigError(format!("EMBEDDING_DIMENSIONS '{raw}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = QueryLibraryConfig::builder().build().unwrap();
        assert_eq!(config.collection_name, "queries");
        assert_eq!(config.limit, 3);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(QueryLibraryConfig::builder().limit(0).build().is_err());
        assert!(QueryLibraryConfig::builder().collection_name("  ").build().is_err());
    }

    #[test]
    fn config_reads_environment_overrides() {
        let config = QueryLibraryConfig::from_lookup(lookup(&[
            ("QUERY_LIBRARY_COLLECTION", "DashboardQueries"),
            ("QUERY_LIBRARY_LIMIT", "5"),
        ]))
        .unwrap();
        assert_eq!(config.collection_name, "DashboardQueries");
        assert_eq!(config.limit, 5);

        let err = QueryLibraryConfig::from_lookup(lookup(&[("QUERY_LIBRARY_LIMIT", "many")]));
        assert!(matches!(err, Err(QueryLibraryError::ConfigError(_))));
    }

    #[test]
    fn store_defaults_to_in_memory() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])).unwrap(), StoreConfig::InMemory);
        assert_eq!(StoreConfig::default().backend_name(), "in-memory");
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = StoreConfig::from_lookup(lookup(&[("VECTOR_STORE", "weaviate")]));
        assert!(matches!(err, Err(QueryLibraryError::ConfigError(_))));
    }

    #[test]
    fn store_config_deserializes_from_tagged_json() {
        let config: StoreConfig = serde_json::from_str(r#"{"backend": "in_memory"}"#).unwrap();
        assert_eq!(config, StoreConfig::InMemory);
    }

    #[cfg(feature = "qdrant")]
    #[test]
    fn qdrant_requires_url_and_dimensions() {
        let err = StoreConfig::from_lookup(lookup(&[("VECTOR_STORE", "qdrant")]));
        assert!(matches!(err, Err(QueryLibraryError::ConfigError(_))));

        let config = StoreConfig::from_lookup(lookup(&[
            ("VECTOR_STORE", "qdrant"),
            ("QDRANT_URL", "http://localhost:6334"),
            ("EMBEDDING_DIMENSIONS", "1536"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            StoreConfig::Qdrant {
                url: "http://localhost:6334".into(),
                api_key: None,
                dimensions: 1536
            }
        );
    }

    #[cfg(feature = "pgvector")]
    #[test]
    fn pgvector_rejects_zero_dimensions() {
        let err = StoreConfig::from_lookup(lookup(&[
            ("VECTOR_STORE", "pgvector"),
            ("DATABASE_URL", "postgres://localhost/queries"),
            ("EMBEDDING_DIMENSIONS", "0"),
        ]));
        assert!(matches!(err, Err(QueryLibraryError::ConfigError(_))));
    }
}
