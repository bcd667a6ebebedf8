//! Command-line arguments for the bill-search binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Fallback port when neither flag, env var, nor config sets one.
pub const DEFAULT_PORT: u16 = 3040;

/// Semantic search over congressional bills.
#[derive(Parser, Debug)]
#[command(name = "billsearch", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// JSON file of bills to index. Overrides `source.documents_path`.
    #[arg(long = "documents")]
    pub documents: Option<PathBuf>,

    /// Run a single search, print the JSON response, and exit.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Number of results for `--query`.
    #[arg(short = 'k', long = "top-k", requires = "query")]
    pub top_k: Option<usize>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BILLSEARCH_CONFIG env var > ./billsearch.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("BILLSEARCH_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("billsearch.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > BILLSEARCH_PORT env var > config file value > 3040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("BILLSEARCH_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// Resolve the log level, falling back to the config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the documents file, falling back to the config file value.
    pub fn resolve_documents_path(&self, config_path: &str) -> PathBuf {
        self.documents
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }
}
