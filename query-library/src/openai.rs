//! OpenAI and Azure OpenAI embedding provider.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{QueryLibraryError, Result};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small` and `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// API version used for Azure OpenAI deployments.
const AZURE_API_VERSION: &str = "2024-02-01";

#[derive(Debug, Clone)]
enum Credentials {
    /// `Authorization: Bearer <key>` (api.openai.com).
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI).
    AzureKey(String),
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API or an Azure
/// OpenAI embedding deployment.
///
/// Uses `reqwest` to call the embeddings endpoint directly.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-3-small`; Azure ignores it in
///   favor of the deployment.
/// - `dimensions` – optional Matryoshka dimension override.
/// - credentials – from the constructor or the environment
///   (`OPENAI_API_KEY`, or `AZURE_OPENAI_ENDPOINT`,
///   `AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME` and `AZURE_OPENAI_API_KEY`).
///
/// # Example
///
/// ```rust,ignore
/// use query_library::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::azure_from_env()?;
/// let vectors = provider.embed("count of subscriptions").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    credentials: Credentials,
    model: Option<String>,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider for api.openai.com with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`) and dimensions (1536).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Self::config_error("API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: OPENAI_EMBEDDINGS_URL.into(),
            credentials: Credentials::Bearer(api_key),
            model: Some(DEFAULT_MODEL.into()),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(Self::env("OPENAI_API_KEY")?)
    }

    /// Create a provider for an Azure OpenAI embedding deployment.
    ///
    /// `endpoint` is the resource URL, e.g. `https://my-resource.openai.azure.com`.
    pub fn azure(
        endpoint: impl AsRef<str>,
        deployment: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.as_ref().trim_end_matches('/');
        let deployment = deployment.as_ref();
        let api_key = api_key.into();
        if endpoint.is_empty() || deployment.is_empty() || api_key.is_empty() {
            return Err(Self::config_error(
                "Azure endpoint, deployment and API key must not be empty",
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: format!(
                "{endpoint}/openai/deployments/{deployment}/embeddings?api-version={AZURE_API_VERSION}"
            ),
            credentials: Credentials::AzureKey(api_key),
            model: None,
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create an Azure provider from `AZURE_OPENAI_ENDPOINT`,
    /// `AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME` and `AZURE_OPENAI_API_KEY`.
    pub fn azure_from_env() -> Result<Self> {
        Self::azure(
            Self::env("AZURE_OPENAI_ENDPOINT")?,
            Self::env("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME")?,
            Self::env("AZURE_OPENAI_API_KEY")?,
        )
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// When set, the API returns embeddings truncated to this size.
    /// This also updates the value returned by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    fn env(name: &str) -> Result<String> {
        std::env::var(name).map_err(|_| {
            QueryLibraryError::ConfigError(format!("{name} environment variable not set"))
        })
    }

    fn config_error(message: &str) -> QueryLibraryError {
        QueryLibraryError::ConfigError(format!("OpenAI embedding provider: {message}"))
    }

    fn provider_name(&self) -> &'static str {
        match self.credentials {
            Credentials::Bearer(_) => "OpenAI",
            Credentials::AzureKey(_) => "AzureOpenAI",
        }
    }

    fn embedding_error(&self, message: String) -> QueryLibraryError {
        QueryLibraryError::EmbeddingError { provider: self.provider_name().into(), message }
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider_name();
        debug!(provider, batch_size = texts.len(), model = ?self.model, "embedding batch");

        let request_body = EmbeddingRequest {
            model: self.model.as_deref(),
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let request = self.client.post(&self.url).json(&request_body);
        let request = match &self.credentials {
            Credentials::Bearer(key) => request.bearer_auth(key),
            Credentials::AzureKey(key) => request.header("api-key", key),
        };

        let response = request.send().await.map_err(|e| {
            error!(provider, error = %e, "request failed");
            self.embedding_error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider, %status, "API error");
            return Err(self.embedding_error(format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider, error = %e, "failed to parse response");
            self.embedding_error(format!("failed to parse response: {e}"))
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<Vec<f32>>> {
        let vectors = self.request(&[text]).await?;
        if vectors.is_empty() {
            return Err(self.embedding_error("API returned empty response".into()));
        }
        Ok(vectors)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(self.embedding_error(format!(
                "API returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
