//! Exchange rate retrieval abstractions

use crate::core::error::{CacheError, FetchError};
use crate::core::exchange::Exchange;
use async_trait::async_trait;
use std::sync::Arc;

/// A remote source of complete exchange snapshots.
#[async_trait]
pub trait ExchangeSource: Send + Sync {
    /// Performs one retrieval. Either the whole snapshot or an error.
    async fn fetch_exchange(&self) -> Result<Exchange, FetchError>;
}

#[async_trait]
impl<T: ExchangeSource + ?Sized> ExchangeSource for Arc<T> {
    async fn fetch_exchange(&self) -> Result<Exchange, FetchError> {
        (**self).fetch_exchange().await
    }
}

/// Read access to the most recent snapshot, without touching the network.
pub trait LatestExchange: Send + Sync {
    fn latest_exchange(&self) -> Result<Arc<Exchange>, CacheError>;
}
