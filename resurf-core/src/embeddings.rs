//! Embedding support for Resurf — Gemini-backed with graceful degradation
//!
//! Two layers:
//! - **GeminiEmbeddingClient** — raw client for the Gemini Embeddings API
//!   (retry with backoff, strict dimension check, returns errors)
//! - **SoftEmbeddingClient** — the client the save pipeline uses: skips
//!   trivially short inputs, caps input length, and converts every failure
//!   into `Ok(None)` so a Save is stored without a vector rather than failing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::text::truncate_chars;

/// Gemini embedding dimensions used for the saves table vector column
pub const EMBEDDING_DIMENSIONS: usize = 3072;

/// Inputs shorter than this (trimmed) are not worth embedding
pub const MIN_EMBED_CHARS: usize = 5;

/// Inputs are capped at this many characters to bound latency and cost
pub const MAX_EMBED_CHARS: usize = 2000;

// ============================================================================
// EmbeddingBackend trait
// ============================================================================

/// Abstraction over embedding providers.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a document text. Returns `None` when no vector is available —
    /// callers must treat that as "store without embedding", not as an error.
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError>;

    /// Embed a search query. Backends that support task-type hints (e.g. Gemini)
    /// can override this to use `RETRIEVAL_QUERY` instead of `RETRIEVAL_DOCUMENT`.
    /// Defaults to calling `embed()`.
    async fn embed_query(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.embed(text).await
    }

    /// Returns the embedding dimension (e.g., 3072).
    fn dimensions(&self) -> usize;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Task type for embedding API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    RetrievalDocument,
    RetrievalQuery,
}

/// Embedding generation errors
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Invalid response: expected {expected} dimensions, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

// ============================================================================
// Config types
// ============================================================================

/// Gemini embedding client configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    model: String,
    content: GeminiContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiEmbeddingClient
// ============================================================================

/// Gemini embedding client — calls the Gemini Embeddings API.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
    base_url: String,
}

impl GeminiEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.api_key.is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: EmbeddingConfig,
        base_url: String,
    ) -> Result<Self, EmbeddingError> {
        if config.api_key.is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Generate an embedding for the given text (direct call, returns raw Vec)
    pub async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_with_task(text, TaskType::RetrievalDocument).await
    }

    /// Generate an embedding with a specific task type
    pub async fn embed_with_task(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(retry_strategy, || self.embed_once(text, task_type)).await;

        match result {
            Ok(vec) => Ok(vec),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All embedding retry attempts failed"
                );
                Err(EmbeddingError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    async fn embed_once(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.config.model, self.config.api_key
        );

        let request = GeminiRequest {
            model: format!("models/{}", self.config.model),
            content: GeminiContent {
                parts: vec![GeminiPart {
                    text: text.to_string(),
                }],
            },
            task_type: Some(task_type),
            output_dimensionality: Some(self.config.dimensions),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(EmbeddingError::Api { code, message });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let values = gemini_response.embedding.values;

        if values.len() != self.config.dimensions {
            return Err(EmbeddingError::InvalidDimensions {
                expected: self.config.dimensions,
                actual: values.len(),
            });
        }

        Ok(values)
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.embed_raw(text).await.map(Some)
    }

    async fn embed_query(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.embed_with_task(text, TaskType::RetrievalQuery)
            .await
            .map(Some)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// SoftEmbeddingClient
// ============================================================================

/// Wraps `GeminiEmbeddingClient` with the save-pipeline contract: inputs
/// shorter than `MIN_EMBED_CHARS` (trimmed) return `Ok(None)` without a call,
/// inputs are capped at `MAX_EMBED_CHARS`, and on any error it logs a warning
/// and returns `Ok(None)` so the Save is stored without an embedding vector.
pub struct SoftEmbeddingClient {
    inner: GeminiEmbeddingClient,
}

impl SoftEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            inner: GeminiEmbeddingClient::new(config)?,
        })
    }

    pub fn with_base_url(config: EmbeddingConfig, base_url: String) -> Result<Self, EmbeddingError> {
        Ok(Self {
            inner: GeminiEmbeddingClient::with_base_url(config, base_url)?,
        })
    }

    fn prepare(text: &str) -> Option<&str> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_EMBED_CHARS {
            return None;
        }
        Some(truncate_chars(trimmed, MAX_EMBED_CHARS))
    }
}

#[async_trait]
impl EmbeddingBackend for SoftEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        let input = match Self::prepare(text) {
            Some(t) => t,
            None => return Ok(None),
        };

        match self.inner.embed_raw(input).await {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Embedding failed — storing save without vector (keyword search only)"
                );
                Ok(None)
            }
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        let input = match Self::prepare(text) {
            Some(t) => t,
            None => return Ok(None),
        };

        match self.inner.embed_with_task(input, TaskType::RetrievalQuery).await {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Query embedding failed — falling back to keyword search"
                );
                Ok(None)
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.inner.config.dimensions
    }

    fn name(&self) -> &str {
        "gemini-soft"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: api_key.to_string(),
            model: "gemini-embedding-001".to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }

    fn mock_embedding_response() -> serde_json::Value {
        let values: Vec<f32> = (0..3072).map(|i| (i as f32) / 3072.0).collect();
        serde_json::json!({
            "embedding": {
                "values": values
            }
        })
    }

    #[tokio::test]
    async fn test_embed_content_calls_api_and_returns_3072_dim_vector() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GeminiEmbeddingClient::with_base_url(config, mock_server.uri())
                .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/models/gemini-embedding-001:embedContent"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "models/gemini-embedding-001",
                "content": { "parts": [{ "text": "hello world" }] },
                "taskType": "RETRIEVAL_DOCUMENT",
                "outputDimensionality": 3072
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_embedding_response()),
            )
            .mount(&mock_server)
            .await;

        let result = client.embed_raw("hello world").await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        let embedding = result.unwrap();
        assert_eq!(embedding.len(), 3072, "Expected 3072 dimensions");
    }

    #[tokio::test]
    async fn test_embed_returns_error_on_api_500() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GeminiEmbeddingClient::with_base_url(config, mock_server.uri())
                .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "Internal server error" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.embed_raw("hello world").await;

        assert!(result.is_err(), "Expected error on 500 response");
        match result {
            Err(EmbeddingError::RetryExhausted { attempts }) => {
                assert_eq!(attempts, 3, "Expected 3 retry attempts");
            }
            _ => panic!("Expected RetryExhausted error"),
        }
    }

    #[tokio::test]
    async fn test_embed_retries_on_429_then_succeeds() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GeminiEmbeddingClient::with_base_url(config, mock_server.uri())
                .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Rate limit exceeded" }
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_embedding_response()),
            )
            .mount(&mock_server)
            .await;

        let result = client.embed_raw("hello world").await;

        assert!(result.is_ok(), "Expected success after retry");
        let embedding = result.unwrap();
        assert_eq!(embedding.len(), 3072);
    }

    #[tokio::test]
    async fn test_embed_fails_with_missing_api_key() {
        let config = test_config("");
        let result = GeminiEmbeddingClient::new(config);

        assert!(result.is_err(), "Expected error with missing API key");
        match result {
            Err(EmbeddingError::MissingApiKey) => {}
            _ => panic!("Expected MissingApiKey error"),
        }
    }

    #[tokio::test]
    async fn test_embed_returns_error_on_wrong_dimensions() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GeminiEmbeddingClient::with_base_url(config, mock_server.uri())
                .expect("Failed to create client");

        let wrong_response = serde_json::json!({
            "embedding": {
                "values": [0.1, 0.2, 0.3]
            }
        });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wrong_response))
            .mount(&mock_server)
            .await;

        let result = client.embed_raw("hello world").await;

        assert!(result.is_err(), "Expected error on wrong dimensions");
        match result {
            Err(EmbeddingError::InvalidDimensions { expected, actual }) => {
                assert_eq!(expected, 3072);
                assert_eq!(actual, 3);
            }
            Err(EmbeddingError::RetryExhausted { .. }) => {
                // Also acceptable
            }
            _ => panic!("Expected InvalidDimensions or RetryExhausted error"),
        }
    }

    // --- SoftEmbeddingClient tests ---

    #[tokio::test]
    async fn test_soft_short_input_returns_none_without_calling_api() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let soft = SoftEmbeddingClient::with_base_url(config, mock_server.uri()).unwrap();

        // No mock mounted: any request would fail the test via Err
        let result = soft.embed("hi").await.unwrap();
        assert!(result.is_none(), "Short input must embed to None");

        let result = soft.embed("   ab   ").await.unwrap();
        assert!(result.is_none(), "Trimmed short input must embed to None");

        let received = mock_server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty(), "Short inputs must not hit the API");
    }

    #[tokio::test]
    async fn test_soft_caps_input_at_2000_chars() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let soft = SoftEmbeddingClient::with_base_url(config, mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_embedding_response()),
            )
            .mount(&mock_server)
            .await;

        let long_input = "x".repeat(5000);
        let result = soft.embed(&long_input).await.unwrap();
        assert!(result.is_some());

        let received = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(&received.last().unwrap().body).unwrap();
        let sent = body["content"]["parts"][0]["text"].as_str().unwrap();
        assert_eq!(sent.chars().count(), MAX_EMBED_CHARS);
    }

    #[tokio::test]
    async fn test_soft_returns_none_on_api_error() {
        let mock_server = MockServer::start().await;
        let config = EmbeddingConfig {
            api_key: "test-key".to_string(),
            model: "gemini-embedding-001".to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
            max_retries: 1,
            retry_delay_ms: 10,
        };
        let soft = SoftEmbeddingClient::with_base_url(config, mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "boom" }
            })))
            .mount(&mock_server)
            .await;

        let result = soft.embed("hello world, long enough to embed").await;
        assert!(result.is_ok(), "Soft client must not propagate errors");
        assert!(result.unwrap().is_none(), "Soft client returns None on error");
        assert_eq!(soft.name(), "gemini-soft");
    }

    #[tokio::test]
    async fn test_soft_query_uses_retrieval_query_task_type() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let soft = SoftEmbeddingClient::with_base_url(config, mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_embedding_response()),
            )
            .mount(&mock_server)
            .await;

        let result = soft.embed_query("rust async tutorials").await.unwrap();
        assert!(result.is_some());

        let received = mock_server.received_requests().await.unwrap();
        let body_str = String::from_utf8_lossy(&received.last().unwrap().body);
        assert!(
            body_str.contains("RETRIEVAL_QUERY"),
            "Query embedding must use RETRIEVAL_QUERY, got: {}",
            body_str
        );
    }
}
