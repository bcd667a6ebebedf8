//! Document sources feeding index rebuilds.
//!
//! The index manager only needs a batch fetch of raw bill records. The
//! dashboard's upstream government APIs live behind this trait; the crate
//! ships an in-memory source and a JSON-file source.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use tracing::debug;

use billsearch_core::error::BillSearchError;
use billsearch_core::types::RawDocument;

/// Provider of raw legislative records.
pub trait DocumentSource: Send + Sync {
    /// Fetch up to `limit` raw documents.
    fn fetch_documents(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RawDocument>, BillSearchError>> + Send;
}

/// Object-safe version of [`DocumentSource`], blanket-implemented for every
/// `DocumentSource`.
pub trait DynDocumentSource: Send + Sync {
    fn fetch_documents_boxed(
        &self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDocument>, BillSearchError>> + Send + '_>>;
}

impl<T: DocumentSource> DynDocumentSource for T {
    fn fetch_documents_boxed(
        &self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDocument>, BillSearchError>> + Send + '_>> {
        Box::pin(self.fetch_documents(limit))
    }
}

// ---------------------------------------------------------------------------
// StaticDocumentSource
// ---------------------------------------------------------------------------

/// In-memory source whose contents can be swapped at runtime.
///
/// Clones share the same underlying list.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentSource {
    documents: Arc<RwLock<Vec<RawDocument>>>,
}

impl StaticDocumentSource {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// Replace the documents returned by subsequent fetches.
    pub fn replace(&self, documents: Vec<RawDocument>) -> Result<(), BillSearchError> {
        let mut guard = self
            .documents
            .write()
            .map_err(|e| BillSearchError::Source(format!("Lock poisoned: {}", e)))?;
        *guard = documents;
        Ok(())
    }
}

impl DocumentSource for StaticDocumentSource {
    async fn fetch_documents(&self, limit: usize) -> Result<Vec<RawDocument>, BillSearchError> {
        let guard = self
            .documents
            .read()
            .map_err(|e| BillSearchError::Source(format!("Lock poisoned: {}", e)))?;
        Ok(guard.iter().take(limit).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// JsonFileSource
// ---------------------------------------------------------------------------

/// Reads a JSON array of raw bill records from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for JsonFileSource {
    async fn fetch_documents(&self, limit: usize) -> Result<Vec<RawDocument>, BillSearchError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BillSearchError::Source(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let mut documents: Vec<RawDocument> = serde_json::from_str(&content)?;
        documents.truncate(limit);
        debug!(path = %self.path.display(), count = documents.len(), "Loaded documents");
        Ok(documents)
    }
}
