use thiserror::Error;

/// Top-level error type for the bill-search system.
///
/// Provider failures are normally absorbed before they reach a caller (the
/// embedding generator falls back to hash vectors, the index manager turns
/// rebuild and search failures into empty responses). The variants here are
/// what flows between those absorption points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BillSearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Document source error: {0}")]
    Source(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot build index from an empty batch")]
    EmptyBuild,
}

impl From<toml::de::Error> for BillSearchError {
    fn from(err: toml::de::Error) -> Self {
        BillSearchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BillSearchError {
    fn from(err: toml::ser::Error) -> Self {
        BillSearchError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BillSearchError {
    fn from(err: serde_json::Error) -> Self {
        BillSearchError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for bill-search operations.
pub type Result<T> = std::result::Result<T, BillSearchError>;
