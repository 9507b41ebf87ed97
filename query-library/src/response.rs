//! Suggestion records and the pipeline's response type.

use serde::{Deserialize, Serialize};

use crate::entry::SearchResult;

/// A suggested query, as handed to dashboard-building callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardQuery {
    /// Identifier assigned by the vector store.
    pub id: String,
    /// Short human-readable name of the query.
    pub title: String,
    /// What the query is for.
    pub description: String,
    /// The query text.
    pub query: String,
}

impl From<SearchResult> for DashboardQuery {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id,
            title: result.title,
            description: result.description,
            query: result.query,
        }
    }
}

/// Outcome of [`QueryLibrary::get_query_suggestions`](crate::QueryLibrary::get_query_suggestions).
///
/// Serialized untagged, so the JSON is either `{"queries": [...]}` or
/// `{"error": "...", "queries": []}`. A failure never carries queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuerySuggestionResponse {
    /// The request failed; `queries` is always empty.
    Failure {
        /// Human-readable failure description.
        error: String,
        /// Always empty.
        queries: Vec<DashboardQuery>,
    },
    /// Suggestions ordered from closest to farthest.
    Success {
        /// The suggested queries.
        queries: Vec<DashboardQuery>,
    },
}

impl QuerySuggestionResponse {
    /// A successful response.
    pub fn success(queries: Vec<DashboardQuery>) -> Self {
        Self::Success { queries }
    }

    /// A failed response with no queries.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into(), queries: Vec::new() }
    }

    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The suggested queries; empty on failure.
    pub fn queries(&self) -> &[DashboardQuery] {
        match self {
            Self::Success { queries } | Self::Failure { queries, .. } => queries,
        }
    }

    /// The failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}
