pub mod types;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use market::{Enricher, RawAssetRecord};
use parking_lot::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::error::{FetchError, UpstreamUnavailable};
use crate::logger::warn_if_slow;
use crate::metrics::CacheCounters;
use crate::upstream::AssetFetcher;

pub use types::{CachePolicy, CacheStats, Freshness, Served, Snapshot};

/// Result of one refresh attempt. Cloned to every reader that waited on it,
/// so all of them observe the same snapshot or the same failure.
#[derive(Clone)]
enum AttemptOutcome {
    Refreshed(Arc<Snapshot>),
    Fallback {
        snapshot: Arc<Snapshot>,
        cause: Arc<FetchError>,
    },
    Unavailable(UpstreamUnavailable),
}

type Attempt = Shared<BoxFuture<'static, AttemptOutcome>>;

#[derive(Default)]
struct CacheState {
    /// Last successfully built snapshot, kept forever as fallback.
    current: Option<Arc<Snapshot>>,
    /// Present while a refresh runs. Cleared in the same critical section
    /// that publishes the refresh result.
    in_flight: Option<Attempt>,
}

struct Inner {
    fetcher: Arc<dyn AssetFetcher>,
    enricher: Enricher,
    policy: CachePolicy,
    state: Mutex<CacheState>,
    counters: CacheCounters,
}

/// Single-snapshot, read-through cache in front of an `AssetFetcher`.
///
/// Guarantees:
/// - A snapshot younger than the TTL is served without suspending.
/// - At most one upstream fetch runs at a time; concurrent readers join it.
/// - Once any fetch has succeeded, readers never see an error: failed
///   refreshes fall back to the last good snapshot, and the next reader
///   retries immediately.
///
/// Cloning is cheap and shares the same state.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<Inner>,
}

impl SnapshotCache {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, enricher: Enricher, policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                enricher,
                policy,
                state: Mutex::new(CacheState::default()),
                counters: CacheCounters::default(),
            }),
        }
    }

    /// Current snapshot regardless of age. Never fetches.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.inner.state.lock().current.clone()
    }

    /// Serve a snapshot, refreshing through the fetcher when the cached one is
    /// missing or older than the TTL.
    ///
    /// Fails only when no snapshot was ever built and the refresh this call
    /// joined failed as well.
    pub async fn get_snapshot(&self) -> Result<Served, UpstreamUnavailable> {
        let attempt = {
            let mut state = self.inner.state.lock();

            if let Some(snapshot) = &state.current {
                let age = snapshot.age();
                if age < self.inner.policy.ttl {
                    CacheCounters::incr(&self.inner.counters.served_fresh);
                    return Ok(Served {
                        snapshot: Arc::clone(snapshot),
                        freshness: Freshness::Fresh,
                        age,
                    });
                }
            }

            if let Some(attempt) = state.in_flight.clone() {
                CacheCounters::incr(&self.inner.counters.coalesced_waits);
                debug!("joining in-flight refresh");
                attempt
            } else {
                let attempt = Inner::start_attempt(&self.inner);
                state.in_flight = Some(attempt.clone());
                attempt
            }
        };

        self.inner.serve(attempt.await)
    }

    pub fn stats(&self) -> CacheStats {
        let (current, refreshing) = {
            let state = self.inner.state.lock();
            (state.current.clone(), state.in_flight.is_some())
        };

        let age = current.as_ref().map(|s| s.age());

        CacheStats {
            has_snapshot: current.is_some(),
            fetched_at: current.as_ref().map(|s| s.fetched_at()),
            age_secs: age.map(|a| a.as_secs()),
            assets: current.as_ref().map_or(0, |s| s.len()),
            fresh: age.is_some_and(|a| a < self.inner.policy.ttl),
            refreshing,
            counters: self.inner.counters.values(),
        }
    }
}

impl Inner {
    /// Spawn the refresh so that readers dropping out (e.g. a closed HTTP
    /// connection) never cancel it for the others.
    ///
    /// If the task itself is cancelled (runtime shutdown), the first waiter to
    /// observe it settles the attempt like any other failure.
    fn start_attempt(inner: &Arc<Inner>) -> Attempt {
        let worker = Arc::clone(inner);
        let settler = Arc::clone(inner);
        let task = tokio::spawn(
            async move {
                match AssertUnwindSafe(worker.refresh()).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => worker.settle_failure(FetchError::Aborted("refresh panicked".into())),
                }
            }
            .in_current_span(),
        );

        async move {
            task.await
                .unwrap_or_else(|e| settler.settle_failure(FetchError::Aborted(e.to_string())))
        }
        .boxed()
        .shared()
    }

    #[instrument(name = "snapshot_refresh", skip(self))]
    async fn refresh(&self) -> AttemptOutcome {
        CacheCounters::incr(&self.counters.fetch_attempts);
        let started = Instant::now();
        let limit = self.policy.fetch_timeout;

        let fetch = warn_if_slow("upstream_fetch", limit / 2, self.fetcher.fetch_raw_assets());
        let fetched = timeout(limit, fetch)
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(limit)));

        match fetched {
            Ok(raw) => self.publish(&raw, started),
            Err(e) => self.settle_failure(e),
        }
    }

    fn publish(&self, raw: &[RawAssetRecord], started: Instant) -> AttemptOutcome {
        let batch = self.enricher.enrich_batch(raw);

        for rejected in &batch.rejected {
            warn!(
                index = rejected.index,
                reason = %rejected.reason,
                "upstream record skipped"
            );
        }

        let skipped = batch.rejected.len();
        let snapshot = Arc::new(Snapshot::new(batch.assets));

        {
            let mut state = self.state.lock();
            state.current = Some(Arc::clone(&snapshot));
            state.in_flight = None;
        }

        CacheCounters::incr(&self.counters.fetch_successes);
        self.counters
            .skipped_records
            .fetch_add(skipped as u64, Ordering::Relaxed);

        info!(
            assets = snapshot.len(),
            skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot refreshed"
        );

        AttemptOutcome::Refreshed(snapshot)
    }

    /// Close the attempt without touching the snapshot, so the next reader
    /// retries instead of waiting out a fresh TTL.
    fn settle_failure(&self, err: FetchError) -> AttemptOutcome {
        CacheCounters::incr(&self.counters.fetch_failures);
        if matches!(err, FetchError::Timeout(_)) {
            CacheCounters::incr(&self.counters.fetch_timeouts);
        }

        let cause = Arc::new(err);
        let previous = {
            let mut state = self.state.lock();
            state.in_flight = None;
            state.current.clone()
        };

        match previous {
            Some(snapshot) => {
                warn!(
                    error = %cause,
                    age_ms = snapshot.age().as_millis() as u64,
                    "refresh failed, serving last good snapshot"
                );
                AttemptOutcome::Fallback { snapshot, cause }
            }
            None => {
                error!(error = %cause, "refresh failed with no snapshot to fall back on");
                AttemptOutcome::Unavailable(UpstreamUnavailable::new(cause))
            }
        }
    }

    fn serve(&self, outcome: AttemptOutcome) -> Result<Served, UpstreamUnavailable> {
        match outcome {
            AttemptOutcome::Refreshed(snapshot) => {
                CacheCounters::incr(&self.counters.served_fresh);
                Ok(Served {
                    age: snapshot.age(),
                    snapshot,
                    freshness: Freshness::Fresh,
                })
            }
            AttemptOutcome::Fallback { snapshot, cause } => {
                CacheCounters::incr(&self.counters.served_stale);
                Ok(Served {
                    age: snapshot.age(),
                    snapshot,
                    freshness: Freshness::Stale { cause },
                })
            }
            AttemptOutcome::Unavailable(e) => {
                CacheCounters::incr(&self.counters.cold_failures);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Succeeds until `fail` is flipped.
    #[derive(Default)]
    struct SwitchFetcher {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetFetcher for SwitchFetcher {
        async fn fetch_raw_assets(&self) -> Result<Vec<RawAssetRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Status(502));
            }
            Ok(vec![
                RawAssetRecord {
                    symbol: "BTCUSDT".into(),
                    price: Some(64_000.0),
                    change_24h: Some(-3.0),
                    ..Default::default()
                },
                RawAssetRecord {
                    symbol: String::new(),
                    price: Some(1.0),
                    ..Default::default()
                },
            ])
        }
    }

    fn cache(fetcher: Arc<SwitchFetcher>) -> SnapshotCache {
        SnapshotCache::new(fetcher, Enricher::default(), CachePolicy::default())
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn failed_refresh_with_snapshot_logs_fallback() {
        let fetcher = Arc::new(SwitchFetcher::default());
        let cache = cache(fetcher.clone());

        cache.get_snapshot().await.unwrap();
        fetcher.fail.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(61)).await;

        let served = cache.get_snapshot().await.unwrap();

        assert!(served.is_stale());
        assert!(logs_contain("serving last good snapshot"));
        assert!(logs_contain("upstream returned status 502"));
    }

    #[tokio::test]
    #[traced_test]
    async fn cold_failure_is_logged_as_error() {
        let fetcher = Arc::new(SwitchFetcher::default());
        fetcher.fail.store(true, Ordering::SeqCst);
        let cache = cache(fetcher);

        let err = cache.get_snapshot().await.unwrap_err();

        assert!(matches!(err.cause(), FetchError::Status(502)));
        assert!(logs_contain("no snapshot to fall back on"));
    }

    #[tokio::test]
    async fn skipped_records_are_counted_not_served() {
        let fetcher = Arc::new(SwitchFetcher::default());
        let cache = cache(fetcher);

        let served = cache.get_snapshot().await.unwrap();

        assert_eq!(served.snapshot.len(), 1);
        assert_eq!(served.snapshot.assets()[0].symbol, "BTC");
        assert_eq!(cache.stats().counters.skipped_records, 1);
    }

    #[tokio::test]
    async fn stats_never_fetch() {
        let fetcher = Arc::new(SwitchFetcher::default());
        let cache = cache(fetcher.clone());

        let stats = cache.stats();

        assert!(!stats.has_snapshot);
        assert!(!stats.fresh);
        assert!(cache.peek().is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
