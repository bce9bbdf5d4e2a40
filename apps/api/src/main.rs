mod catalogue;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalogue::embedding::build_embedder;
use crate::catalogue::loader::CatalogueLoader;
use crate::catalogue::store::CatalogueStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::generation::fetcher::JobPageFetcher;
use crate::llm_client::build_http_client;
use crate::routes::build_router;
use crate::session::SessionState;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on an incomplete embedding backend)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cover letter service v{}", env!("CARGO_PKG_VERSION"));

    // Open the vector store
    let pool = create_pool(&config.vectorstore_path).await?;
    let embedder = build_embedder(
        &config.embedding,
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    info!("Embedder initialized ({} dimensions)", embedder.dimensions());
    let store = CatalogueStore::new(pool, config.collection.clone(), embedder);
    info!(
        "Collection '{}' holds {} entries",
        store.collection(),
        store.count().await?
    );

    // HTTP clients
    let fetcher = JobPageFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let llm_http = build_http_client(&config.llm)?;
    info!(
        "LLM client initialized (endpoint: {}, default model: {})",
        config.llm.base_url, config.llm.model
    );

    let session = SessionState::new(config.llm.api_key.clone(), config.llm.model.clone());

    // Build app state
    let state = AppState {
        config: config.clone(),
        loader: Arc::new(CatalogueLoader::new(store)),
        fetcher,
        llm_http,
        session: Arc::new(RwLock::new(session)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
