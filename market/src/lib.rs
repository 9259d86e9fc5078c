//! Market domain: raw upstream records, the enriched public asset shape, and
//! the pure policies (signal thresholds, symbol normalization) that connect
//! them. Nothing in this crate performs I/O.

pub mod enrich;
pub mod error;
pub mod signal;
pub mod symbol;
pub mod types;

pub use enrich::{EnrichedBatch, Enricher, RejectedRecord};
pub use error::{EnrichError, PolicyError};
pub use signal::{DEFAULT_SIGNAL_THRESHOLD, Signal, SignalPolicy};
pub use symbol::{DEFAULT_QUOTE_SUFFIX, SymbolNormalizer};
pub use types::{EnrichedAsset, RawAssetRecord};
