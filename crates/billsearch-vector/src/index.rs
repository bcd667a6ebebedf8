//! In-memory vector index with brute-force cosine similarity search.
//!
//! Search is O(N·L) per query. Document counts stay in the low hundreds, so
//! exhaustive scoring keeps results exact and deterministic; an approximate
//! index can replace this one later as long as it reproduces the same
//! ranking for small N.

use std::cmp::Ordering;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::info;

use billsearch_core::error::BillSearchError;
use billsearch_core::types::{BillEmbedding, IndexStats, RankedResult};

/// Snapshot of one complete build.
#[derive(Debug, Default)]
struct IndexContents {
    entries: Vec<BillEmbedding>,
    dimensions: Option<usize>,
    built: bool,
    last_built: Option<DateTime<Utc>>,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// `build` assembles the new contents off to the side and swaps them in
/// under the write lock, so a concurrent `search` sees either the old build
/// or the new one, never a mix.
#[derive(Debug, Default)]
pub struct VectorIndex {
    contents: RwLock<IndexContents>,
}

impl VectorIndex {
    /// Create a new empty, unbuilt index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents wholesale.
    ///
    /// Every vector must have length `dimensions`. An empty batch or a
    /// vector of any other length is rejected and the previous contents are
    /// left untouched.
    pub fn build(
        &self,
        embeddings: Vec<BillEmbedding>,
        dimensions: usize,
    ) -> Result<(), BillSearchError> {
        if embeddings.is_empty() {
            return Err(BillSearchError::EmptyBuild);
        }
        if dimensions == 0 {
            return Err(BillSearchError::Index(
                "embedding dimensionality must be non-zero".to_string(),
            ));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(BillSearchError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            });
        }

        let count = embeddings.len();
        let fresh = IndexContents {
            entries: embeddings,
            dimensions: Some(dimensions),
            built: true,
            last_built: Some(Utc::now()),
        };

        let mut contents = self
            .contents
            .write()
            .map_err(|e| BillSearchError::Index(format!("Lock poisoned: {}", e)))?;
        *contents = fresh;

        info!(count, dimensions, "Vector index built");
        Ok(())
    }

    /// Return at most `top_k` entries with similarity `>= min_similarity`,
    /// ordered by descending similarity. Equal scores keep insertion order.
    ///
    /// An unbuilt index yields an empty list. A query vector whose length
    /// differs from the build's dimensionality is rejected.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<RankedResult>, BillSearchError> {
        let contents = self
            .contents
            .read()
            .map_err(|e| BillSearchError::Index(format!("Lock poisoned: {}", e)))?;

        if !contents.built || top_k == 0 {
            return Ok(Vec::new());
        }

        if let Some(expected) = contents.dimensions {
            if query.len() != expected {
                return Err(BillSearchError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f64)> = contents
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .filter(|(_, score)| *score >= min_similarity)
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| {
                let document = &contents.entries[i].document;
                RankedResult {
                    id: document.id.clone(),
                    title: document.title.clone(),
                    summary: document.summary.clone(),
                    similarity,
                    metadata: document.metadata.clone(),
                }
            })
            .collect())
    }

    /// Discard all entries and return to the unbuilt state.
    pub fn clear(&self) -> Result<(), BillSearchError> {
        let mut contents = self
            .contents
            .write()
            .map_err(|e| BillSearchError::Index(format!("Lock poisoned: {}", e)))?;
        *contents = IndexContents::default();
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        self.contents
            .read()
            .map(|c| IndexStats {
                count: c.entries.len(),
                is_built: c.built,
                dimensions: c.dimensions,
            })
            .unwrap_or_default()
    }

    /// When the current contents were built, if built.
    pub fn last_built(&self) -> Option<DateTime<Utc>> {
        self.contents.read().ok().and_then(|c| c.last_built)
    }

    /// Return the number of vectors currently stored in the index.
    pub fn len(&self) -> usize {
        self.contents.read().map(|c| c.entries.len()).unwrap_or(0)
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors of equal length.
///
/// Returns 0.0 if either vector has zero magnitude.
///
/// # Panics
///
/// Panics if the lengths differ. Callers compare dimensionality first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len(), "cosine similarity over vectors of different length");

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
