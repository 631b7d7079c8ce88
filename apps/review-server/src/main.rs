//! ADGM Review Server
//!
//! Accepts batches of .docx corporate filings, classifies each one, flags
//! compliance red flags and returns the documents with every issue attached
//! as a Word comment. Provides REST API endpoints for:
//!
//! - Batch review with a required-document checklist summary
//! - Checklist listing
//! - Health
//!
//! ## Architecture
//!
//! The server owns a single `Reviewer`, built at startup together with the
//! reference corpus used for issue enrichment. Requests share it read-only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use review_core::{LookupConfig, RagLookup, ReviewConfig, Reviewer};

mod api;
mod error;

use api::{handle_health, handle_list_checklists, handle_review};

/// Command-line arguments for the review server
///
/// Unset options fall back to the REVIEW_* / RAG_* / LLM_* environment.
#[derive(Parser, Debug)]
#[command(name = "review-server")]
#[command(about = "ADGM document review server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Folder of .txt/.md ADGM references used for enrichment
    #[arg(long)]
    references: Option<std::path::PathBuf>,

    /// OpenAI-compatible chat endpoint
    #[arg(long)]
    llm_url: Option<String>,

    /// Knowledge lookups per document
    #[arg(long)]
    max_lookups: Option<usize>,

    /// Per-lookup timeout in milliseconds
    #[arg(long)]
    lookup_timeout_ms: Option<u64>,

    /// Append the review section to every returned document
    #[arg(long)]
    append_summary: bool,

    /// Maximum request body size in megabytes
    #[arg(long, default_value = "25")]
    body_limit_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub reviewer: Arc<Reviewer>,
}

/// Routes plus CORS and body-limit middleware
pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/checklists", get(handle_list_checklists))
        .route("/api/review", post(handle_review))
        // Applied innermost-first: CORS ends up outermost, as in a ServiceBuilder stack
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ReviewConfig::from_env()?;
    if let Some(max) = args.max_lookups {
        config.max_enriched_issues = max;
    }
    if let Some(ms) = args.lookup_timeout_ms {
        config.lookup_timeout_ms = ms;
    }
    if args.append_summary {
        config.append_review_summary = true;
    }

    let mut lookup_config = LookupConfig::from_env()?;
    if let Some(dir) = args.references {
        lookup_config.reference_dir = dir;
    }
    if let Some(url) = args.llm_url {
        lookup_config.llm_base_url = Some(url);
    }

    let lookup = RagLookup::from_config(
        &lookup_config,
        Duration::from_millis(config.lookup_timeout_ms),
    )?;

    info!("Starting review server on {}:{}", args.host, args.port);
    info!(
        "Comment author: {} ({}), lookups per document: {}",
        config.author, config.initials, config.max_enriched_issues
    );

    let state = AppState {
        reviewer: Arc::new(Reviewer::new(config).with_lookup(Arc::new(lookup))),
    };

    let app = build_router(state, args.body_limit_mb * 1024 * 1024);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
