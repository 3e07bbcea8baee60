//! Error types for parsing, fetching and serving exchange rates.

use rust_decimal::Decimal;
use thiserror::Error;

/// A payload that does not follow the HNB exchange list format.
///
/// Line numbers are 1-based and refer to the line of the payload that
/// caused parsing to abort.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Error in parsing date on line {line}: {content:?}")]
    InvalidDate {
        line: usize,
        content: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Unknown exchange format on line {line}: {content:?}")]
    UnknownFormat { line: usize, content: String },

    #[error("Invalid currency code block on line {line}: {content:?}")]
    InvalidCodeBlock { line: usize, content: String },

    #[error("Error in parsing units on line {line}: {content:?}")]
    InvalidUnits { line: usize, content: String },

    #[error("Error in parsing rate {value:?} on line {line}: {content:?}")]
    InvalidRate {
        line: usize,
        content: String,
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("Exchange list has no header line")]
    MissingHeader,
}

/// Failure of a single retrieval attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error in fetching data from {url:?}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} from {url:?}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Error in reading response from {url:?}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] ParseError),
}

impl FetchError {
    /// Whether the remote answered but the payload was malformed.
    pub fn is_format(&self) -> bool {
        matches!(self, FetchError::Format(_))
    }
}

/// Errors a reader can receive from the rate cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Rate cache is closed")]
    Closed,

    #[error("Exchange rates are not yet available")]
    NotYetAvailable,

    #[error("Rate updater did not pick up the refresh request")]
    RefreshNotPickedUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("No exchange rate for currency {0:?}")]
    UnknownCurrency(String),

    #[error("Invalid rate type {0:?}, expected one of buy, middle, sell")]
    InvalidRateType(String),

    #[error("Converting {value} {currency} overflows")]
    Overflow { value: Decimal, currency: String },
}
