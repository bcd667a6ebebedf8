//! Bill-search vector crate - embedding generator, vector index, document
//! sources, and the index lifecycle manager.
//!
//! Provides an in-memory brute-force cosine index, an embedding generator
//! that falls back to deterministic hash vectors when no provider answers,
//! and the manager that keeps the index built and fresh for callers.

pub mod embedding;
pub mod index;
pub mod manager;
pub mod source;

pub use embedding::{
    EmbeddingGenerator, EmbeddingService, HashEmbedding, HttpEmbeddingService,
};
pub use index::{cosine_similarity, VectorIndex};
pub use manager::{IndexManager, RebuildOutcome};
pub use source::{DocumentSource, JsonFileSource, StaticDocumentSource};
