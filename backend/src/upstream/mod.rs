pub mod client;
pub mod types;

use async_trait::async_trait;
use market::RawAssetRecord;

use crate::error::FetchError;

pub use client::CoinGeckoClient;

/// Source of raw asset records. Called once per cache refresh; implementations
/// must tolerate being called repeatedly.
#[async_trait]
pub trait AssetFetcher: Send + Sync + 'static {
    async fn fetch_raw_assets(&self) -> Result<Vec<RawAssetRecord>, FetchError>;
}
