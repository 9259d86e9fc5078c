use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use market::EnrichedAsset;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::metrics::CounterValues;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    /// Snapshots younger than this are served without touching the upstream.
    pub ttl: Duration,
    /// Bound on one refresh attempt; expiry counts as a fetch failure.
    pub fetch_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Immutable enriched view of all tracked assets at one point in time.
/// Replaced wholesale on every successful refresh.
#[derive(Debug)]
pub struct Snapshot {
    /// Enriched assets in upstream ranking order.
    assets: Vec<EnrichedAsset>,

    /// Wall-clock time of the fetch that produced this snapshot.
    fetched_at: DateTime<Utc>,

    /// Monotonic twin of `fetched_at`, used for TTL decisions.
    loaded_at: Instant,
}

impl Snapshot {
    pub fn new(assets: Vec<EnrichedAsset>) -> Self {
        Self {
            assets,
            fetched_at: Utc::now(),
            loaded_at: Instant::now(),
        }
    }

    pub fn assets(&self) -> &[EnrichedAsset] {
        &self.assets
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }
}

#[derive(Debug, Clone)]
pub enum Freshness {
    /// Younger than the TTL, or produced by the refresh the caller waited on.
    Fresh,
    /// Last good snapshot, served because the latest refresh failed.
    Stale { cause: Arc<FetchError> },
}

/// What a successful `get_snapshot` hands to a reader.
#[derive(Debug, Clone)]
pub struct Served {
    pub snapshot: Arc<Snapshot>,
    pub freshness: Freshness,
    /// Snapshot age at the moment it was served.
    pub age: Duration,
}

impl Served {
    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale { .. })
    }
}

/// Read-only cache status; never triggers a fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub has_snapshot: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_secs: Option<u64>,
    pub assets: usize,
    /// Whether the current snapshot is within the TTL.
    pub fresh: bool,
    pub refreshing: bool,
    pub counters: CounterValues,
}
