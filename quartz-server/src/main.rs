//! QuartzDB HTTP API Server
//!
//! A high-performance REST API server for QuartzDB.

use annidx_store::MemPostingStore;
use quartz_server::{AppState, create_router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quartz_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting QuartzDB HTTP API Server");

    // The posting store backing both the KV API and the vector index is
    // in-memory only: there is no on-disk engine in this workspace for
    // quartz-server to sit on top of, so there is nothing to configure or
    // load here. A real deployment swaps `MemPostingStore` for a
    // `PostingStore` backed by a durable transactional engine without
    // touching anything above this line.
    let store = Arc::new(MemPostingStore::new());
    tracing::info!("✅ In-memory posting store initialized");

    let state = AppState::new(store);

    // Build router with middleware
    let app = create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new());

    // Configure server address
    let host = std::env::var("QUARTZ_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("QUARTZ_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("📚 API Documentation:");
    tracing::info!("   GET    /api/v1/health                      - Health check");
    tracing::info!("   GET    /api/v1/stats                       - Storage statistics");
    tracing::info!("   GET    /api/v1/kv/{{key}}                     - Retrieve value");
    tracing::info!("   POST   /api/v1/kv/{{key}}                     - Store value");
    tracing::info!("   DELETE /api/v1/kv/{{key}}                     - Delete value");
    tracing::info!("");
    tracing::info!("🔍 Vector Search API (Named Indexes):");
    tracing::info!("   GET    /api/v1/indexes                     - List all indexes");
    tracing::info!("   POST   /api/v1/indexes/{{name}}               - Create/open index");
    tracing::info!("   DELETE /api/v1/indexes/{{name}}               - Delete index");
    tracing::info!("   POST   /api/v1/indexes/{{name}}/vectors       - Insert vector");
    tracing::info!("   POST   /api/v1/indexes/{{name}}/vectors/search - Search vectors");
    tracing::info!("   GET    /api/v1/indexes/{{name}}/vectors/{{id}}  - Retrieve vector");
    tracing::info!("   DELETE /api/v1/indexes/{{name}}/vectors/{{id}}  - Delete vector");
    tracing::info!("");
    tracing::info!("🎯 Ready to accept requests!");

    // Run server
    axum::serve(listener, app).await?;

    tracing::info!("👋 Server shutdown complete");

    Ok(())
}
