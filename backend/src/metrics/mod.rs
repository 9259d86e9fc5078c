pub mod counters;

pub use counters::{CacheCounters, CounterValues};
