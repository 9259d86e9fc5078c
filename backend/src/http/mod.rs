pub mod handlers;

use std::path::Path;

use axum::{Router, middleware, routing::get};
use tower_http::services::ServeDir;

use crate::snapshot::SnapshotCache;

#[derive(Clone)]
pub struct AppState {
    pub cache: SnapshotCache,
}

impl AppState {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }
}

/// API routes plus the static frontend for everything else
/// (`/` resolves to `index.html` in `static_dir`).
pub fn router(cache: SnapshotCache, static_dir: impl AsRef<Path>) -> Router {
    let frontend = ServeDir::new(static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/market-data", get(handlers::market_data))
        .route("/health", get(handlers::health))
        .fallback_service(frontend)
        .layer(middleware::from_fn(handlers::trace_request))
        .with_state(AppState::new(cache))
}
