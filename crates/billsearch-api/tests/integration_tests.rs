//! Integration tests for the bill-search API.
//!
//! Every test builds its own router over an in-memory document source and
//! the hash embedding fallback, so no network access is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use billsearch_api::create_router;
use billsearch_api::handlers::{HealthResponse, RebuildResponse, RefreshResponse};
use billsearch_api::state::AppState;
use billsearch_core::config::BillSearchConfig;
use billsearch_core::types::{RawDocument, SearchResponse};
use billsearch_vector::{EmbeddingGenerator, IndexManager, StaticDocumentSource};

// =============================================================================
// Helpers
// =============================================================================

fn bill(id: &str, title: &str, sponsor: &str) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        title: title.to_string(),
        sponsor: Some(sponsor.to_string()),
        introduced_date: Some("2024-03-12".to_string()),
        ..Default::default()
    }
}

fn bills() -> Vec<RawDocument> {
    vec![
        bill("A", "clean energy tax credit", "Rep. Alvarez"),
        bill("B", "corporate tax reform act", "Sen. Brooks"),
        bill("C", "renewable energy grant program", "Rep. Chen"),
    ]
}

fn make_state_with(source: StaticDocumentSource) -> AppState {
    let config = BillSearchConfig::default();
    let generator = EmbeddingGenerator::from_config(&config.embedding).unwrap();
    let manager = IndexManager::new(generator, source, config.index.clone());
    AppState::new(config, Arc::new(manager))
}

fn make_app() -> axum::Router {
    create_router(make_state_with(StaticDocumentSource::new(bills())))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let resp = make_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.indexed_documents, 0);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_ranks_relevant_bill_first() {
    let resp = make_app()
        .oneshot(get("/api/search?q=renewable%20energy%20incentives&top_k=2&min_similarity=0.1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let ids: Vec<&str> = body.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A"]);
    assert_eq!(body.total_results, 2);
    assert_eq!(body.results[0].metadata.sponsor.as_deref(), Some("Rep. Chen"));
}

#[tokio::test]
async fn test_search_response_uses_camel_case() {
    let resp = make_app()
        .oneshot(get("/api/search?q=corporate%20tax%20reform"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(json.get("totalResults").is_some());
    assert!(json.get("searchTimeMillis").is_some());
    assert_eq!(json["results"][0]["id"], "B");
    assert_eq!(json["results"][0]["metadata"]["date"], "2024-03-12");
}

#[tokio::test]
async fn test_search_no_matches_is_empty_not_error() {
    let resp = make_app()
        .oneshot(get("/api/search?q=zebra%20migration%20patterns"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.results.is_empty());
    assert_eq!(body.total_results, 0);
}

#[tokio::test]
async fn test_search_missing_query() {
    let resp = make_app().oneshot(get("/api/search")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_search_blank_query() {
    let resp = make_app().oneshot(get("/api/search?q=%20%20")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_threshold_out_of_range() {
    let resp = make_app()
        .oneshot(get("/api/search?q=energy&min_similarity=1.5"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_top_k_zero_returns_nothing() {
    let resp = make_app()
        .oneshot(get("/api/search?q=energy&top_k=0&min_similarity=-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.results.is_empty());
    assert_eq!(body.total_results, 0);
}

#[tokio::test]
async fn test_search_with_empty_source() {
    let app = create_router(make_state_with(StaticDocumentSource::new(Vec::new())));
    let resp = app.oneshot(get("/api/search?q=energy")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.results.is_empty());
}

// =============================================================================
// Administrative endpoints
// =============================================================================

#[tokio::test]
async fn test_stats_before_and_after_search() {
    let app = make_app();

    let resp = app.clone().oneshot(get("/api/search/stats")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["isBuilt"], false);
    assert_eq!(json["state"], "uninitialized");

    app.clone().oneshot(get("/api/search?q=energy")).await.unwrap();

    let resp = app.oneshot(get("/api/search/stats")).await.unwrap();
    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["isBuilt"], true);
    assert_eq!(json["count"], 3);
    assert_eq!(json["isInitialized"], true);
    assert_eq!(json["state"], "fresh");
    assert!(json["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_refresh_picks_up_new_documents() {
    let source = StaticDocumentSource::new(bills());
    let app = create_router(make_state_with(source.clone()));

    app.clone().oneshot(get("/api/search?q=energy")).await.unwrap();

    source
        .replace(vec![bill("D", "rural broadband expansion act", "Rep. Diaz")])
        .unwrap();

    let resp = app.clone().oneshot(post("/api/search/refresh")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: RefreshResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(refreshed.refreshed);

    let resp = app
        .oneshot(get("/api/search?q=rural%20broadband"))
        .await
        .unwrap();
    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let ids: Vec<&str> = body.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["D"]);
}

#[tokio::test]
async fn test_rebuild_reports_document_count() {
    let resp = make_app().oneshot(post("/api/search/rebuild")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: RebuildResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.rebuilt);
    assert_eq!(body.indexed_documents, 3);
}

#[tokio::test]
async fn test_rebuild_with_empty_source_is_skipped() {
    let app = create_router(make_state_with(StaticDocumentSource::new(Vec::new())));
    let resp = app.oneshot(post("/api/search/rebuild")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: RebuildResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(!body.rebuilt);
    assert_eq!(body.indexed_documents, 0);
}

#[tokio::test]
async fn test_refresh_requires_post() {
    let resp = make_app().oneshot(get("/api/search/refresh")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route() {
    let resp = make_app().oneshot(get("/api/bills")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
