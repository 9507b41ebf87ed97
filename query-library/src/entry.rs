//! Data types for stored entries, search results, and collection schemas.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{QueryLibraryError, Result};

/// Text fields every collection carries.
pub const CORE_FIELDS: [&str; 3] = ["title", "description", "query"];

/// Names the adapters use for their own columns and payload keys.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "seq", "embedding", "vector"];

/// One indexed example query with its caller-supplied vector.
///
/// Entries are immutable once inserted. The vector's length must match the
/// collection's dimensionality; stores do not check this, so mismatches are
/// the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Short human-readable name of the query.
    pub title: String,
    /// What the query is for.
    pub description: String,
    /// The stored example query text.
    pub query: String,
    /// The embedding for this entry.
    pub vector: Vec<f32>,
}

impl Entry {
    /// Create a new entry.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        query: impl Into<String>,
        vector: Vec<f32>,
    ) -> Self {
        Self { title: title.into(), description: description.into(), query: query.into(), vector }
    }
}

/// An entry returned by a nearest-neighbor search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Identifier the store assigned to the entry on insertion.
    pub id: String,
    /// The entry's title.
    pub title: String,
    /// The entry's description.
    pub description: String,
    /// The entry's query text.
    pub query: String,
    /// Distance to the query vector (lower is closer), if the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// The shape of a collection: its text fields and vector dimensionality.
///
/// Collections never vectorize on their own; every entry's vector is
/// supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionSchema {
    /// Names of the text fields stored per entry.
    pub text_fields: Vec<String>,
    /// Vector dimensionality. When unset the adapter infers it from the first
    /// inserted vector or falls back to its configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl Default for CollectionSchema {
    fn default() -> Self {
        Self { text_fields: CORE_FIELDS.iter().map(|f| f.to_string()).collect(), dimensions: None }
    }
}

impl CollectionSchema {
    /// Set the vector dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Add an extra text field.
    pub fn with_text_field(mut self, name: impl Into<String>) -> Self {
        self.text_fields.push(name.into());
        self
    }

    /// Check that the schema contains the core fields and that every field
    /// name is a plain identifier, unique, and not one of [`RESERVED_FIELDS`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::InvalidSchema`] on the first violation.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for core in CORE_FIELDS {
            if !self.text_fields.iter().any(|f| f == core) {
                return Err(QueryLibraryError::InvalidSchema(format!(
                    "missing required text field '{core}'"
                )));
            }
        }
        for field in &self.text_fields {
            let valid = field.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(QueryLibraryError::InvalidSchema(format!(
                    "field name '{field}' is not a valid identifier"
                )));
            }
            if RESERVED_FIELDS.contains(&field.to_ascii_lowercase().as_str()) {
                return Err(QueryLibraryError::InvalidSchema(format!(
                    "field name '{field}' is reserved"
                )));
            }
            if !seen.insert(field.to_ascii_lowercase()) {
                return Err(QueryLibraryError::InvalidSchema(format!(
                    "field '{field}' is declared more than once"
                )));
            }
        }
        if self.dimensions == Some(0) {
            return Err(QueryLibraryError::InvalidSchema(
                "dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Text fields beyond `title`, `description` and `query`.
    pub fn extra_fields(&self) -> impl Iterator<Item = &str> {
        self.text_fields.iter().map(String::as_str).filter(|f| !CORE_FIELDS.contains(f))
    }
}

/// A catalogued example query before it has been embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryExample {
    /// Short human-readable name of the query.
    pub title: String,
    /// What the query is for.
    pub description: String,
    /// The query text itself.
    pub query: String,
}

impl QueryExample {
    /// Parse a JSON array of examples.
    ///
    /// # Errors
    ///
    /// Returns [`QueryLibraryError::ConfigError`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(|e| {
            QueryLibraryError::ConfigError(format!("invalid query example catalogue: {e}"))
        })
    }

    /// The text that is embedded for this example.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }

    /// Attach a vector, producing an insertable [`Entry`].
    pub fn into_entry(self, vector: Vec<f32>) -> Entry {
        Entry { title: self.title, description: self.description, query: self.query, vector }
    }
}
