use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BillSearchError, Result};

/// Default embedding dimensionality shared by the HTTP provider request and
/// the hash fallback.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Top-level configuration for the bill-search service.
///
/// The binary reads `./billsearch.toml` unless `--config` or
/// `BILLSEARCH_CONFIG` names another file. Every section falls back to its
/// defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillSearchConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl BillSearchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BillSearchConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values that parse but cannot be served.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimensions == 0 {
            return Err(BillSearchError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.embedding.max_input_chars == 0 {
            return Err(BillSearchError::Config(
                "embedding.max_input_chars must be greater than zero".to_string(),
            ));
        }
        if self.index.max_top_k == 0 {
            return Err(BillSearchError::Config(
                "index.max_top_k must be greater than zero".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.index.min_similarity) {
            return Err(BillSearchError::Config(format!(
                "index.min_similarity must be between -1 and 1, got {}",
                self.index.min_similarity
            )));
        }
        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist. A file that exists but fails to parse or
    /// validate is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("No config file at {}. Using defaults.", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BillSearchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
    /// Browser origins allowed to call the API (the dashboard front end).
    pub allowed_origins: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Which embedding backend to use for the primary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// No external model; every vector comes from the hash fallback.
    Hash,
    /// OpenAI-compatible `/embeddings` endpoint.
    Http,
}

/// Embedding generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Base URL of the embedding API (without the `/embeddings` suffix).
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Environment variable holding the API key. The key itself is never
    /// written to the config file.
    pub api_key_env: String,
    /// Vector length L used by the provider request and the fallback.
    pub dimensions: usize,
    /// Cleaned input is truncated to this many characters.
    pub max_input_chars: usize,
    /// Per-call timeout; a timeout counts as provider unavailable.
    pub request_timeout_ms: u64,
    /// Pause between consecutive calls during a batch.
    pub throttle_ms: u64,
}

impl EmbeddingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "BILLSEARCH_EMBEDDING_API_KEY".to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            max_input_chars: 1000,
            request_timeout_ms: 10_000,
            throttle_ms: 100,
        }
    }
}

/// Index lifecycle and query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum cache age before the next search triggers a rebuild.
    pub ttl_secs: u64,
    /// Result count when the caller does not ask for one.
    pub default_top_k: usize,
    /// Upper bound for caller-supplied result counts.
    pub max_top_k: usize,
    /// Minimum cosine similarity for a result to be returned.
    pub min_similarity: f64,
    /// Number of documents requested from the source per rebuild.
    pub max_documents: usize,
}

impl IndexConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            default_top_k: 10,
            max_top_k: 50,
            min_similarity: 0.2,
            max_documents: 200,
        }
    }
}

/// Document source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON file containing an array of raw bill records.
    pub documents_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            documents_path: "data/bills.json".to_string(),
        }
    }
}
