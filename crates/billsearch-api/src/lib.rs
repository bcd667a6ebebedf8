//! Bill-search API crate - axum HTTP server and route handlers.
//!
//! Exposes the caller-facing semantic search endpoint, the administrative
//! refresh and stats endpoints, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
