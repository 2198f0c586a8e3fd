//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use reelid_api::{create_router, metrics, ApiConfig, AppState};
use reelid_engine::{init_tracing, EngineConfig, EngineDeps, SessionManager};
use reelid_media::FfmpegFrameExtractor;
use reelid_providers::{GoogleSearchClient, ProviderConfig, TmdbClient, VisionService};
use reelid_storage::{JsonFrameAnalysisStore, LocalVideoCatalog, StorageConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("reelid=info");

    info!("Starting reelid-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let providers = ProviderConfig::from_env();
    info!(providers = ?providers.configured_providers(), "Provider configuration loaded");
    let storage = StorageConfig::from_env();
    let engine = EngineConfig::from_env();

    let deps = EngineDeps {
        videos: Arc::new(LocalVideoCatalog::new(&storage.upload_dir)),
        analyses: Arc::new(JsonFrameAnalysisStore::new(&storage.analysis_dir)),
        frames: Arc::new(FfmpegFrameExtractor::new().context("FFmpeg is required")?),
        vision: Arc::new(VisionService::from_config(&providers)?),
        search: Arc::new(GoogleSearchClient::from_config(&providers)?),
        films: Arc::new(TmdbClient::from_config(&providers)?),
    };
    let state = AppState::new(config.clone(), SessionManager::new(deps, engine));

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus recorder unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
