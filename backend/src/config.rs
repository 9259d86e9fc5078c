use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use market::{
    DEFAULT_QUOTE_SUFFIX, DEFAULT_SIGNAL_THRESHOLD, Enricher, SignalPolicy, SymbolNormalizer,
};

use crate::snapshot::CachePolicy;

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// API root, e.g. `https://api.coingecko.com/api/v3`.
    pub base_url: String,

    /// Currency prices are quoted in.
    pub vs_currency: String,

    /// Number of assets requested (upstream ranking order).
    pub per_page: u32,

    /// Per-request timeout applied by the HTTP client itself.
    pub request_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Directory served for every path not handled by the API.
    pub static_dir: PathBuf,

    pub upstream: UpstreamConfig,

    // =========================
    // Cache configuration
    // =========================
    /// Maximum age of a snapshot before a reader triggers a refresh.
    ///
    /// Within this window readers never touch the upstream.
    pub cache_ttl: Duration,

    /// Upper bound on one refresh attempt.
    ///
    /// Expiry is treated as a failed fetch: readers get the last good
    /// snapshot, or `503` on a cold start.
    pub fetch_timeout: Duration,

    // =========================
    // Enrichment configuration
    // =========================
    /// Percentage band around zero that maps to `NEUTRAL`.
    pub signal: SignalPolicy,

    /// Quote currency stripped from pair-style tickers. Empty disables it.
    pub quote_suffix: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` uses the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let static_dir = lookup("STATIC_DIR").unwrap_or_else(|| "public".to_string());

        let fetch_timeout = Duration::from_millis(parse_or(&lookup, "FETCH_TIMEOUT_MS", 5_000u64)?);
        if fetch_timeout.is_zero() {
            return Err(anyhow!("FETCH_TIMEOUT_MS must be greater than zero"));
        }

        let per_page = parse_or(&lookup, "MARKET_DATA_PER_PAGE", 20u32)?;
        if !(1..=250).contains(&per_page) {
            return Err(anyhow!("MARKET_DATA_PER_PAGE must be within 1..=250, got {per_page}"));
        }

        let upstream = UpstreamConfig {
            base_url: lookup("MARKET_DATA_URL")
                .unwrap_or_else(|| "https://api.coingecko.com/api/v3".to_string()),
            vs_currency: lookup("MARKET_DATA_CURRENCY").unwrap_or_else(|| "usd".to_string()),
            per_page,
            request_timeout: fetch_timeout,
        };

        let threshold = parse_or(&lookup, "SIGNAL_THRESHOLD", DEFAULT_SIGNAL_THRESHOLD)?;
        let signal = SignalPolicy::new(threshold).context("invalid SIGNAL_THRESHOLD")?;

        Ok(Self {
            bind_addr,
            static_dir: PathBuf::from(static_dir),
            upstream,
            cache_ttl: Duration::from_secs(parse_or(&lookup, "CACHE_TTL_SECS", 60u64)?),
            fetch_timeout,
            signal,
            quote_suffix: lookup("QUOTE_SUFFIX").unwrap_or_else(|| DEFAULT_QUOTE_SUFFIX.to_string()),
        })
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: self.cache_ttl,
            fetch_timeout: self.fetch_timeout,
        }
    }

    pub fn enricher(&self) -> Enricher {
        Enricher::new(self.signal, SymbolNormalizer::new(&self.quote_suffix))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key}={raw:?}: {e}")),
    }
}
