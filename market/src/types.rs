use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// One asset as delivered by the upstream feed, before enrichment.
///
/// Every field except the symbol may be missing upstream; enrichment decides
/// what is recoverable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAssetRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,

    /// 24h change in percent (signed).
    pub change_24h: Option<f64>,

    pub icon: Option<String>,
}

/// Public output unit served to readers.
///
/// `signal` and `signal_color` are computed together during enrichment and
/// always describe `change_24h` under the threshold active at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedAsset {
    pub symbol: String,
    pub display_name: String,
    pub price: f64,

    #[serde(rename = "change24h")]
    pub change_24h: Option<f64>,

    pub icon: String,
    pub signal: Signal,
    pub signal_color: String,
}
