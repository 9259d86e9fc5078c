use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single upstream fetch attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("invalid response from upstream: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

/// Returned by the cache only when nothing was ever fetched successfully and
/// the current attempt failed too.
#[derive(Error, Debug, Clone)]
#[error("market data unavailable, no snapshot cached yet: {cause}")]
pub struct UpstreamUnavailable {
    #[source]
    cause: Arc<FetchError>,
}

impl UpstreamUnavailable {
    pub fn new(cause: Arc<FetchError>) -> Self {
        Self { cause }
    }

    pub fn cause(&self) -> &FetchError {
        &self.cause
    }
}
