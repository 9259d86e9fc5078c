use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct CacheCounters {
    pub fetch_attempts: Arc<AtomicU64>,
    pub fetch_successes: Arc<AtomicU64>,
    pub fetch_failures: Arc<AtomicU64>,
    pub fetch_timeouts: Arc<AtomicU64>,

    /// Readers that joined an attempt someone else started.
    pub coalesced_waits: Arc<AtomicU64>,

    pub served_fresh: Arc<AtomicU64>,
    pub served_stale: Arc<AtomicU64>,
    pub cold_failures: Arc<AtomicU64>,

    /// Upstream records dropped during enrichment.
    pub skipped_records: Arc<AtomicU64>,
}

/// Point-in-time copy of `CacheCounters`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterValues {
    pub fetch_attempts: u64,
    pub fetch_successes: u64,
    pub fetch_failures: u64,
    pub fetch_timeouts: u64,
    pub coalesced_waits: u64,
    pub served_fresh: u64,
    pub served_stale: u64,
    pub cold_failures: u64,
    pub skipped_records: u64,
}

impl CacheCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn values(&self) -> CounterValues {
        let load = |c: &Arc<AtomicU64>| c.load(Ordering::Relaxed);

        CounterValues {
            fetch_attempts: load(&self.fetch_attempts),
            fetch_successes: load(&self.fetch_successes),
            fetch_failures: load(&self.fetch_failures),
            fetch_timeouts: load(&self.fetch_timeouts),
            coalesced_waits: load(&self.coalesced_waits),
            served_fresh: load(&self.served_fresh),
            served_stale: load(&self.served_stale),
            cold_failures: load(&self.cold_failures),
            skipped_records: load(&self.skipped_records),
        }
    }
}
