//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use billsearch_core::config::BillSearchConfig;
use billsearch_vector::IndexManager;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<BillSearchConfig>,
    /// Owner of the vector index and its rebuild lifecycle.
    pub manager: Arc<IndexManager>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: BillSearchConfig, manager: Arc<IndexManager>) -> Self {
        Self {
            config: Arc::new(config),
            manager,
            start_time: Instant::now(),
        }
    }
}
