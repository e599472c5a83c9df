//! Linkfind command-line tool.
//!
//! Loads a JSON schema document into an in-memory schema graph, loads a
//! persisted search request, runs it and returns the response. The binary
//! in `main.rs` wires this to the command line, logging and Ctrl-C.

pub mod config;

use std::sync::Arc;

use anyhow::Context;
use linkfind_engine::backends::memory::MemoryGraph;
use linkfind_engine::{SearchEngine, SearchRequest, SearchResponse};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use config::CliConfig;

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so stdout carries only the response. `RUST_LOG`
/// overrides `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkfind={},linkfind_engine={}", level, level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Loads the request named by `config`, applying the keyword override.
pub fn load_request(config: &CliConfig) -> anyhow::Result<SearchRequest> {
    let text = std::fs::read_to_string(&config.request)
        .with_context(|| format!("reading request {}", config.request.display()))?;
    let mut request = SearchRequest::from_json(&text)
        .with_context(|| format!("parsing request {}", config.request.display()))?;

    if let Some(keyword) = &config.keyword {
        request.keyword = keyword.clone();
    }
    Ok(request)
}

/// Runs the search described by `config` until it completes or `cancel`
/// fires.
pub async fn run(config: &CliConfig, cancel: CancellationToken) -> anyhow::Result<SearchResponse> {
    let graph = MemoryGraph::load(&config.schema)
        .with_context(|| format!("loading schema {}", config.schema.display()))?;
    let request = load_request(config)?;
    let engine_config = config.engine_config()?;

    info!(
        schema = %config.schema.display(),
        keyword = %request.keyword,
        items = request.item_count(),
        parallel = engine_config.parallel,
        "Running search"
    );

    let engine = SearchEngine::with_config(Arc::new(graph), engine_config);
    let response = engine.find_with_cancellation(request, cancel).await?;
    Ok(response)
}
