//! Embedding service trait and implementations.
//!
//! - `HttpEmbeddingService` calls an OpenAI-compatible `/embeddings`
//!   endpoint. This is the production embedding backend.
//! - `HashEmbedding` derives deterministic bag-of-words vectors from the
//!   text itself. It is the fallback whenever the provider is missing,
//!   fails, times out, or returns a vector of the wrong length.
//! - `EmbeddingGenerator` wraps both behind an infallible `embed` and adds
//!   input cleaning and throttled batch embedding.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use billsearch_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use billsearch_core::error::BillSearchError;
use billsearch_core::types::{truncate_chars, BillEmbedding, DocumentRecord};

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors. Used for
/// both index builds and query embedding.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, BillSearchError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future` and so cannot be used
/// behind `dyn`. A blanket implementation boxes the future, so every
/// `EmbeddingService` is also a `DynEmbeddingService`.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, BillSearchError>> + Send + 'a>>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, BillSearchError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// Text cleaning
// ---------------------------------------------------------------------------

/// Replace non-alphanumeric characters with spaces, collapse whitespace,
/// trim, and truncate to `max_chars` characters.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars).trim_end().to_string()
}

// ---------------------------------------------------------------------------
// HttpEmbeddingService - OpenAI-compatible endpoint
// ---------------------------------------------------------------------------

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingService {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingService {
    /// Build a client against `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self, BillSearchError> {
        if api_key.trim().is_empty() {
            return Err(BillSearchError::Config("missing embedding API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(BillSearchError::Config("missing embedding model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| BillSearchError::Config("invalid embedding API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BillSearchError::Embedding(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
        })
    }

    /// Build from configuration, reading the key from `api_key_env`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, BillSearchError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BillSearchError::Config(format!("environment variable {} is not set", config.api_key_env))
        })?;
        Self::new(
            &api_key,
            &config.endpoint,
            &config.model,
            config.dimensions,
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BillSearchError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BillSearchError::Embedding(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(BillSearchError::Embedding(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| BillSearchError::Embedding(format!("invalid response body: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| BillSearchError::Embedding("provider returned no embeddings".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// HashEmbedding - deterministic fallback
// ---------------------------------------------------------------------------

/// Deterministic bag-of-words embedding.
///
/// Each whitespace token is lowercased and hashed (64-bit FNV-1a) into one of
/// `dimensions` buckets; the bucket accumulates `1 / (position + 1)` so that
/// earlier tokens weigh more. The result is L2-normalized. The output is a
/// pure function of the input string, identical across calls, processes and
/// builds. Text that yields no tokens maps to the all-zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        assert!(dimensions > 0, "embedding dimensionality must be non-zero");
        Self { dimensions }
    }

    /// Compute the fallback vector for already-cleaned text.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut result = vec![0.0f32; self.dimensions];

        for (position, token) in text.split_whitespace().enumerate() {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimensions as u64) as usize;
            result[bucket] += 1.0 / (position as f32 + 1.0);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BillSearchError> {
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

// ---------------------------------------------------------------------------
// EmbeddingGenerator
// ---------------------------------------------------------------------------

/// Turns text into vectors of a fixed length, never failing.
///
/// Tries the configured provider first (bounded by a per-call timeout) and
/// falls back to [`HashEmbedding`] on absence, error, timeout, or a vector
/// whose length differs from the generator's dimensionality. Every vector
/// it returns therefore has length [`EmbeddingGenerator::dimensions`].
pub struct EmbeddingGenerator {
    provider: Option<Box<dyn DynEmbeddingService>>,
    fallback: HashEmbedding,
    max_input_chars: usize,
    timeout: Duration,
    throttle: Duration,
}

impl std::fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("has_provider", &self.provider.is_some())
            .field("dimensions", &self.fallback.dimensions)
            .field("max_input_chars", &self.max_input_chars)
            .field("timeout", &self.timeout)
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl EmbeddingGenerator {
    /// A generator without an external provider: every vector comes from
    /// the hash fallback.
    pub fn fallback_only(dimensions: usize) -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            provider: None,
            fallback: HashEmbedding::new(dimensions),
            max_input_chars: defaults.max_input_chars,
            timeout: defaults.request_timeout(),
            throttle: defaults.throttle(),
        }
    }

    /// Build from configuration. An HTTP provider that cannot be
    /// constructed (missing key, bad endpoint) degrades to fallback-only;
    /// a zero dimensionality is a configuration error.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, BillSearchError> {
        if config.dimensions == 0 {
            return Err(BillSearchError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        let provider: Option<Box<dyn DynEmbeddingService>> = match config.provider {
            EmbeddingProviderKind::Hash => None,
            EmbeddingProviderKind::Http => match HttpEmbeddingService::from_config(config) {
                Ok(service) => {
                    info!(endpoint = service.endpoint(), model = %config.model, "Embedding provider configured");
                    Some(Box::new(service))
                }
                Err(e) => {
                    warn!(error = %e, "Embedding provider unavailable, using hash fallback");
                    None
                }
            },
        };

        Ok(Self {
            provider,
            fallback: HashEmbedding::new(config.dimensions),
            max_input_chars: config.max_input_chars,
            timeout: config.request_timeout(),
            throttle: config.throttle(),
        })
    }

    /// Attach a primary provider.
    pub fn with_provider(mut self, provider: impl EmbeddingService + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.fallback.dimensions
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Embed `text`, always producing a vector of length `dimensions()`.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let cleaned = clean_text(text, self.max_input_chars);

        if let Some(provider) = &self.provider {
            if !cleaned.is_empty() {
                match tokio::time::timeout(self.timeout, provider.embed_boxed(&cleaned)).await {
                    Ok(Ok(vector)) if vector.len() == self.dimensions() => return vector,
                    Ok(Ok(vector)) => warn!(
                        expected = self.dimensions(),
                        actual = vector.len(),
                        "Provider returned wrong dimensionality, using hash fallback"
                    ),
                    Ok(Err(e)) => warn!(error = %e, "Embedding provider failed, using hash fallback"),
                    Err(_) => warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Embedding provider timed out, using hash fallback"
                    ),
                }
            }
        }

        self.fallback.vector_for(&cleaned)
    }

    /// Embed each document's `full_text` in order.
    ///
    /// Calls are sequential with a fixed pause between provider calls.
    /// Documents with no embeddable text are logged and skipped; the rest of
    /// the batch continues.
    pub async fn embed_batch(&self, documents: &[DocumentRecord]) -> Vec<BillEmbedding> {
        let mut embeddings = Vec::with_capacity(documents.len());
        let mut called_provider = false;

        for document in documents {
            if clean_text(&document.full_text, self.max_input_chars).is_empty() {
                warn!(id = %document.id, "Skipping document with no embeddable text");
                continue;
            }

            if self.provider.is_some() {
                if called_provider && !self.throttle.is_zero() {
                    tokio::time::sleep(self.throttle).await;
                }
                called_provider = true;
            }

            let embedding = self.embed(&document.full_text).await;
            debug!(id = %document.id, "Document embedded");
            embeddings.push(BillEmbedding {
                document: document.clone(),
                embedding,
            });
        }

        info!(
            requested = documents.len(),
            embedded = embeddings.len(),
            "Batch embedding complete"
        );
        embeddings
    }
}
