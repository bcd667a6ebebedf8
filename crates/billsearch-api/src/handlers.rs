//! Route handler functions for all API endpoints.
//!
//! Each handler extracts query parameters via axum extractors, calls the
//! index manager, and returns JSON responses.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use billsearch_core::types::{ManagerStats, SearchResponse};
use billsearch_vector::RebuildOutcome;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f64>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub indexed_documents: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub rebuilt: bool,
    pub indexed_documents: usize,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /api/search - semantic search over indexed bills.
///
/// Validation failures are 400s. Everything past validation is handled by
/// the manager, which degrades to an empty result instead of failing.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = params
        .q
        .ok_or_else(|| ApiError::BadRequest("Parameter 'q' is required for search".to_string()))?;

    if q.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Parameter 'q' must not be empty".to_string(),
        ));
    }

    if let Some(min) = params.min_similarity {
        if !(-1.0..=1.0).contains(&min) {
            return Err(ApiError::BadRequest(format!(
                "Parameter 'min_similarity' must be between -1 and 1, got {}",
                min
            )));
        }
    }

    let response = state
        .manager
        .search_with_threshold(&q, params.top_k, params.min_similarity)
        .await;

    Ok(Json(response))
}

/// POST /api/search/refresh - drop the index; the next search rebuilds it.
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.manager.refresh().await;
    Json(RefreshResponse { refreshed: true })
}

/// POST /api/search/rebuild - rebuild the index now.
pub async fn rebuild(State(state): State<AppState>) -> Result<Json<RebuildResponse>, ApiError> {
    let response = match state.manager.initialize().await? {
        RebuildOutcome::Rebuilt { count } => RebuildResponse {
            rebuilt: true,
            indexed_documents: count,
        },
        RebuildOutcome::SkippedNoDocuments => RebuildResponse {
            rebuilt: false,
            indexed_documents: state.manager.get_stats().index.count,
        },
    };
    Ok(Json(response))
}

/// GET /api/search/stats - index contents and lifecycle state.
pub async fn stats(State(state): State<AppState>) -> Json<ManagerStats> {
    Json(state.manager.get_stats())
}

/// GET /health - liveness plus index size.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        indexed_documents: state.manager.get_stats().index.count,
    })
}
