use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("signal threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
}

/// Reason a single raw record could not become an `EnrichedAsset`.
/// Scoped to that record; the rest of the batch is unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichError {
    #[error("record has an empty symbol")]
    EmptySymbol,

    #[error("{symbol}: price missing")]
    MissingPrice { symbol: String },

    #[error("{symbol}: price {price} is not a non-negative number")]
    InvalidPrice { symbol: String, price: f64 },
}
