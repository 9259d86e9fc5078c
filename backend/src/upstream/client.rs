use std::time::Duration;

use async_trait::async_trait;
use market::RawAssetRecord;
use reqwest::{Client, header::ACCEPT};
use tracing::{debug, instrument};

use crate::config::UpstreamConfig;
use crate::error::FetchError;
use crate::upstream::AssetFetcher;
use crate::upstream::types::CoinMarket;

/// Fetches the top assets by market cap from a CoinGecko-compatible API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    markets_url: String,
    vs_currency: String,
    per_page: String,
    request_timeout: Duration,
}

impl CoinGeckoClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(cfg.request_timeout)
            .connect_timeout(cfg.request_timeout.min(Duration::from_secs(3)))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(concat!("snapshot-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            markets_url: format!("{}/coins/markets", cfg.base_url.trim_end_matches('/')),
            vs_currency: cfg.vs_currency.clone(),
            per_page: cfg.per_page.to_string(),
            request_timeout: cfg.request_timeout,
        })
    }

    pub fn markets_url(&self) -> &str {
        &self.markets_url
    }

    /// The client's own deadline surfaces as `Timeout`, same as the cache's.
    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.request_timeout)
        } else {
            FetchError::Http(e)
        }
    }
}

/// Decode a `/coins/markets` body into raw records, keeping upstream order.
pub fn parse_markets(body: &[u8]) -> Result<Vec<RawAssetRecord>, FetchError> {
    let markets: Vec<CoinMarket> = serde_json::from_slice(body)?;
    Ok(markets.into_iter().map(RawAssetRecord::from).collect())
}

#[async_trait]
impl AssetFetcher for CoinGeckoClient {
    #[instrument(
        skip(self),
        fields(url = %self.markets_url, vs_currency = %self.vs_currency),
        level = "debug"
    )]
    async fn fetch_raw_assets(&self) -> Result<Vec<RawAssetRecord>, FetchError> {
        let resp = self
            .http
            .get(&self.markets_url)
            .header(ACCEPT, "application/json")
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", self.per_page.as_str()),
                ("page", "1"),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        let records = parse_markets(&body)?;

        debug!(records = records.len(), "upstream markets fetched");

        Ok(records)
    }
}
