use crate::{
    error::EnrichError,
    signal::SignalPolicy,
    symbol::SymbolNormalizer,
    types::{EnrichedAsset, RawAssetRecord},
};

/// A raw record that enrichment had to drop, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// Position in the upstream batch.
    pub index: usize,
    pub reason: EnrichError,
}

/// Result of enriching a whole upstream batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedBatch {
    /// Enriched assets in upstream order.
    pub assets: Vec<EnrichedAsset>,
    pub rejected: Vec<RejectedRecord>,
}

/// Pure mapping from raw upstream records to the public asset shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enricher {
    signal: SignalPolicy,
    symbols: SymbolNormalizer,
}

impl Enricher {
    pub fn new(signal: SignalPolicy, symbols: SymbolNormalizer) -> Self {
        Self { signal, symbols }
    }

    pub fn symbols(&self) -> &SymbolNormalizer {
        &self.symbols
    }

    /// Enrich a single record.
    ///
    /// A missing or non-finite change is not an error: it is reported as
    /// `None` and classified neutral. Only a record without a usable symbol or
    /// price is rejected.
    pub fn enrich(&self, raw: &RawAssetRecord) -> Result<EnrichedAsset, EnrichError> {
        let symbol = self.symbols.normalize(&raw.symbol);
        if symbol.is_empty() {
            return Err(EnrichError::EmptySymbol);
        }

        let price = match raw.price {
            None => return Err(EnrichError::MissingPrice { symbol }),
            Some(p) if !p.is_finite() || p < 0.0 => {
                return Err(EnrichError::InvalidPrice { symbol, price: p });
            }
            Some(p) => p,
        };

        let change_24h = raw.change_24h.filter(|c| c.is_finite());
        let signal = self.signal.classify(change_24h);

        let display_name = raw
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| symbol.clone(), str::to_string);

        Ok(EnrichedAsset {
            symbol,
            display_name,
            price,
            change_24h,
            icon: raw.icon.clone().unwrap_or_default(),
            signal,
            signal_color: signal.color().to_string(),
        })
    }

    /// Enrich a batch, preserving upstream order. A bad record never aborts
    /// the rest of the batch.
    pub fn enrich_batch(&self, raw: &[RawAssetRecord]) -> EnrichedBatch {
        let mut batch = EnrichedBatch {
            assets: Vec::with_capacity(raw.len()),
            rejected: Vec::new(),
        };

        for (index, record) in raw.iter().enumerate() {
            match self.enrich(record) {
                Ok(asset) => batch.assets.push(asset),
                Err(reason) => batch.rejected.push(RejectedRecord { index, reason }),
            }
        }

        batch
    }
}
