use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{Instrument, debug, field, warn};

use crate::http::AppState;
use crate::logger::{TraceId, annotate_request, root_span};
use crate::snapshot::CacheStats;

pub const STALE_HEADER: HeaderName = HeaderName::from_static("x-data-stale");
pub const AGE_HEADER: HeaderName = HeaderName::from_static("x-data-age-secs");
pub const FETCHED_AT_HEADER: HeaderName = HeaderName::from_static("x-data-fetched-at");

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    cause: String,
}

/// `GET /market-data`: the current snapshot's assets as a JSON array.
///
/// A stale snapshot is still a success; it is flagged through headers only.
pub async fn market_data(State(state): State<AppState>) -> Response {
    match state.cache.get_snapshot().await {
        Ok(served) => {
            let stale = served.is_stale();
            let age_secs = served.age.as_secs();

            if stale {
                debug!(age_secs, "serving stale market data");
            }

            let mut resp = Json(served.snapshot.assets()).into_response();
            let headers = resp.headers_mut();
            headers.insert(
                STALE_HEADER,
                HeaderValue::from_static(if stale { "true" } else { "false" }),
            );
            headers.insert(AGE_HEADER, HeaderValue::from(age_secs));
            if let Ok(v) = HeaderValue::from_str(&served.snapshot.fetched_at().to_rfc3339()) {
                headers.insert(FETCHED_AT_HEADER, v);
            }
            resp
        }
        Err(e) => {
            warn!(error = %e, "market data requested before first successful fetch");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: "market data is not available yet",
                    cause: e.cause().to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub cache: CacheStats,
}

/// `GET /health`: cache status without triggering a fetch.
pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let cache = state.cache.stats();
    let status = match (cache.has_snapshot, cache.fresh) {
        (false, _) => "warming_up",
        (true, true) => "ok",
        (true, false) => "stale",
    };

    Json(HealthBody { status, cache })
}

/// Runs every request inside a root span carrying a fresh trace id.
pub async fn trace_request(req: Request, next: Next) -> Response {
    let trace_id = TraceId::default();
    let span = root_span("http_request", &trace_id);

    async move {
        annotate_request(req.method().as_str(), req.uri().path());
        let resp = next.run(req).await;
        tracing::Span::current().record("status", field::display(resp.status().as_u16()));
        resp
    }
    .instrument(span)
    .await
}
