//! Bill-search application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the embedding generator (HTTP provider or hash fallback)
//! 3. Wire the document source into the index manager
//! 4. Warm the index, then either answer a single `--query` or start the
//!    axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use billsearch_api::routes;
use billsearch_api::state::AppState;
use billsearch_core::config::BillSearchConfig;
use billsearch_vector::{EmbeddingGenerator, IndexManager, JsonFileSource, RebuildOutcome};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = BillSearchConfig::load_or_default(&config_file)?;

    // Tracing. RUST_LOG wins over flag and config.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting billsearch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Embeddings.
    let generator = EmbeddingGenerator::from_config(&config.embedding)?;
    tracing::info!(
        dimensions = generator.dimensions(),
        provider = generator.has_provider(),
        "Embedding generator ready"
    );

    // Documents and index lifecycle.
    let documents_path = args.resolve_documents_path(&config.source.documents_path);
    tracing::info!(path = %documents_path.display(), "Using JSON document source");
    let manager = Arc::new(IndexManager::new(
        generator,
        JsonFileSource::new(documents_path),
        config.index.clone(),
    ));

    // Warm the index. Failure is not fatal; searches retry the build.
    match manager.initialize().await {
        Ok(RebuildOutcome::Rebuilt { count }) => {
            tracing::info!(count, "Index warmed");
        }
        Ok(RebuildOutcome::SkippedNoDocuments) => {
            tracing::warn!("No documents available, index left empty");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Initial index build failed, will retry on first search");
        }
    }

    // One-shot query mode.
    if let Some(ref query) = args.query {
        let response = manager.search(query, args.top_k).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        manager.dispose().await;
        return Ok(());
    }

    // API server.
    let port = args.resolve_port(config.general.port);
    let state = AppState::new(config, Arc::clone(&manager));
    routes::start_server(port, state).await?;

    Ok(())
}
