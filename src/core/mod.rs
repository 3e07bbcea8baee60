//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod exchange;
pub mod log;
pub mod source;

// Re-export main types for cleaner imports
pub use error::{CacheError, ConversionError, FetchError, ParseError};
pub use exchange::{Exchange, Rate, RateType};
pub use source::{ExchangeSource, LatestExchange};
