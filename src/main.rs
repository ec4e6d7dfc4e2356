//! Watchlist server binary

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use watchlist::api::{create_router, AppState};
use watchlist::config::{AppConfig, LogFormat};
use watchlist::storage::{create_storage, StorageBackend};
use watchlist::store::DocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    let storage_config = config
        .storage_runtime()
        .context("invalid storage configuration")?;
    tracing::info!(?storage_config, "Opening storage");

    let storage_backend = create_storage(storage_config).await?;
    let storage: Arc<dyn StorageBackend> = Arc::from(storage_backend);

    // Replays any write batch left unfinished by a previous crash
    let store = DocumentStore::open(storage)
        .await
        .context("failed to open document store")?;

    let node_id = config.node_id();
    tracing::info!(%node_id, "Starting watchlist node");

    let router = create_router(AppState::new(Arc::new(store), node_id));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "Listening for HTTP traffic");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("watchlist=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    Ok(())
}
