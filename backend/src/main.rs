use std::sync::Arc;

use anyhow::Context;
use snapshot_backend::{
    config::AppConfig,
    http,
    logger::init_tracing,
    snapshot::SnapshotCache,
    upstream::{AssetFetcher, CoinGeckoClient},
};
use tokio::net::TcpListener;

/// Builds the upstream client and the cache it feeds.
fn setup_cache(cfg: &AppConfig) -> anyhow::Result<SnapshotCache> {
    let client = CoinGeckoClient::new(&cfg.upstream).context("failed to build upstream client")?;
    let fetcher: Arc<dyn AssetFetcher> = Arc::new(client);

    Ok(SnapshotCache::new(fetcher, cfg.enricher(), cfg.cache_policy()))
}

/// Fills the cache once in the background so the first reader rarely waits.
fn warm_up(cache: SnapshotCache) {
    tokio::spawn(async move {
        match cache.get_snapshot().await {
            Ok(served) => tracing::info!(assets = served.snapshot.len(), "cache warmed up"),
            Err(e) => tracing::warn!(error = %e, "cache warm-up failed; readers will retry"),
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting market snapshot service...");

    let cfg = AppConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        upstream = %cfg.upstream.base_url,
        ttl_secs = cfg.cache_ttl.as_secs(),
        fetch_timeout_ms = cfg.fetch_timeout.as_millis() as u64,
        threshold = cfg.signal.threshold(),
        "configuration loaded"
    );

    let cache = setup_cache(&cfg)?;
    warm_up(cache.clone());

    let app = http::router(cache, &cfg.static_dir);

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    tracing::info!(addr = %cfg.bind_addr, static_dir = %cfg.static_dir.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    Ok(())
}
