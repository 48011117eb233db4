//! Price provider abstraction

use crate::core::error::FetchError;
use crate::core::snapshot::RawPayload;
use async_trait::async_trait;

/// One bounded-time request to a price provider. Implementations never retry;
/// retry policy belongs to the scheduler.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_once(&self) -> Result<RawPayload, FetchError>;
}
