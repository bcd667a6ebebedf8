//! Index lifecycle manager.
//!
//! Owns the vector index, builds it lazily from the document source, and
//! rebuilds it when the cached build is older than the TTL or after an
//! explicit refresh. `search` is the caller-facing entry point and never
//! returns an error: failures are logged and degrade to an empty response.
//!
//! Rebuilds are single-flight: the first caller to see a stale cache takes
//! the rebuild lock, and callers arriving meanwhile wait on it and then
//! re-check freshness instead of rebuilding again.

use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use billsearch_core::config::IndexConfig;
use billsearch_core::error::BillSearchError;
use billsearch_core::types::{
    DocumentRecord, IndexState, ManagerStats, RankedResult, SearchResponse,
};

use crate::embedding::EmbeddingGenerator;
use crate::index::VectorIndex;
use crate::source::{DocumentSource, DynDocumentSource};

/// What a rebuild attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The index now holds `count` documents.
    Rebuilt { count: usize },
    /// The source returned nothing; the previous index was kept.
    SkippedNoDocuments,
}

#[derive(Debug, Default)]
struct Freshness {
    initialized: bool,
    last_update: Option<Instant>,
    last_update_at: Option<DateTime<Utc>>,
}

/// Owns the index and keeps it fresh.
///
/// Constructed explicitly by the composition root; nothing here is global.
pub struct IndexManager {
    index: VectorIndex,
    generator: EmbeddingGenerator,
    source: Box<dyn DynDocumentSource>,
    config: IndexConfig,
    freshness: Mutex<Freshness>,
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl IndexManager {
    pub fn new(
        generator: EmbeddingGenerator,
        source: impl DocumentSource + 'static,
        config: IndexConfig,
    ) -> Self {
        Self::new_dyn(generator, Box::new(source), config)
    }

    /// Create a manager from a pre-boxed document source.
    pub fn new_dyn(
        generator: EmbeddingGenerator,
        source: Box<dyn DynDocumentSource>,
        config: IndexConfig,
    ) -> Self {
        Self {
            index: VectorIndex::new(),
            generator,
            source,
            config,
            freshness: Mutex::new(Freshness::default()),
            rebuild_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Search with the configured minimum similarity.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> SearchResponse {
        self.search_with_threshold(query, top_k, None).await
    }

    /// Search, optionally overriding the minimum similarity.
    ///
    /// `top_k` defaults to `default_top_k` and is capped at `max_top_k`;
    /// zero yields no results. Never fails; on error the response is empty.
    pub async fn search_with_threshold(
        &self,
        query: &str,
        top_k: Option<usize>,
        min_similarity: Option<f64>,
    ) -> SearchResponse {
        let started = Instant::now();

        match self.try_search(query, top_k, min_similarity).await {
            Ok(results) => {
                let elapsed = started.elapsed().as_millis() as u64;
                debug!(results = results.len(), elapsed_ms = elapsed, "Search complete");
                SearchResponse {
                    total_results: results.len(),
                    results,
                    search_time_millis: elapsed,
                }
            }
            Err(e) => {
                error!(error = %e, "Search failed, returning empty result");
                SearchResponse::empty(started.elapsed().as_millis() as u64)
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        top_k: Option<usize>,
        min_similarity: Option<f64>,
    ) -> Result<Vec<RankedResult>, BillSearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.ensure_fresh().await;

        let query_vector = self.generator.embed(query).await;
        let top_k = top_k
            .unwrap_or(self.config.default_top_k)
            .min(self.config.max_top_k);
        let min_similarity = min_similarity.unwrap_or(self.config.min_similarity);

        self.index.search(&query_vector, top_k, min_similarity)
    }

    /// Rebuild if the cache is uninitialized or expired.
    ///
    /// A failed rebuild leaves the previous build in place and is logged;
    /// the query is then served from whatever the index holds.
    async fn ensure_fresh(&self) {
        if self.is_fresh() {
            return;
        }

        let _guard = self.rebuild_lock.lock().await;
        if self.is_fresh() {
            debug!("Index rebuilt by a concurrent caller");
            return;
        }

        if let Err(e) = self.rebuild().await {
            error!(error = %e, "Index rebuild failed, serving previous state");
        }
    }

    /// Build the index now, regardless of freshness.
    pub async fn initialize(&self) -> Result<RebuildOutcome, BillSearchError> {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild().await
    }

    /// Caller must hold `rebuild_lock`.
    async fn rebuild(&self) -> Result<RebuildOutcome, BillSearchError> {
        let started = Instant::now();
        let raw = self
            .source
            .fetch_documents_boxed(self.config.max_documents)
            .await?;

        if raw.is_empty() {
            warn!("Document source returned no documents, keeping previous index");
            return Ok(RebuildOutcome::SkippedNoDocuments);
        }

        let documents: Vec<DocumentRecord> = raw.into_iter().map(DocumentRecord::from_raw).collect();
        let embeddings = self.generator.embed_batch(&documents).await;
        if embeddings.is_empty() {
            warn!(
                fetched = documents.len(),
                "No fetched document had embeddable text, keeping previous index"
            );
            return Ok(RebuildOutcome::SkippedNoDocuments);
        }
        let count = embeddings.len();
        self.index.build(embeddings, self.generator.dimensions())?;

        self.mark_fresh()?;
        info!(
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Index rebuilt"
        );
        Ok(RebuildOutcome::Rebuilt { count })
    }

    /// Force the next search to rebuild, and drop the current build.
    ///
    /// Waits for an in-flight rebuild to finish first so the cleared state
    /// is not overwritten by it.
    pub async fn refresh(&self) {
        let _guard = self.rebuild_lock.lock().await;
        self.reset();
        info!("Index refresh requested");
    }

    /// Release the index contents. The manager stays usable; the next
    /// search rebuilds from scratch.
    pub async fn dispose(&self) {
        let _guard = self.rebuild_lock.lock().await;
        self.reset();
        info!("Index manager disposed");
    }

    fn reset(&self) {
        if let Ok(mut freshness) = self.freshness.lock() {
            freshness.initialized = false;
        }
        if let Err(e) = self.index.clear() {
            error!(error = %e, "Failed to clear index");
        }
    }

    fn mark_fresh(&self) -> Result<(), BillSearchError> {
        let mut freshness = self
            .freshness
            .lock()
            .map_err(|e| BillSearchError::Index(format!("Lock poisoned: {}", e)))?;
        freshness.initialized = true;
        freshness.last_update = Some(Instant::now());
        freshness.last_update_at = Some(Utc::now());
        Ok(())
    }

    fn is_fresh(&self) -> bool {
        self.state() == IndexState::Fresh
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IndexState {
        let Ok(freshness) = self.freshness.lock() else {
            return IndexState::Stale;
        };
        match (freshness.initialized, freshness.last_update) {
            (true, Some(at)) if at.elapsed() < self.config.ttl() => IndexState::Fresh,
            (false, None) => IndexState::Uninitialized,
            _ => IndexState::Stale,
        }
    }

    pub fn get_stats(&self) -> ManagerStats {
        let (is_initialized, last_update) = self
            .freshness
            .lock()
            .map(|f| (f.initialized, f.last_update_at))
            .unwrap_or((false, None));

        ManagerStats {
            index: self.index.stats(),
            last_update,
            is_initialized,
            state: self.state(),
        }
    }
}
