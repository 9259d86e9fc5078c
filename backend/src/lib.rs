pub mod config;
pub mod http;
pub mod metrics;
pub mod snapshot;
pub mod upstream;

pub mod error;
pub mod logger;
