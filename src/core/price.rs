//! Pricing abstractions

use crate::core::asset::AssetPrices;
use crate::core::error::FetchResult;
use async_trait::async_trait;

/// Source of USD prices for the whole supported asset set.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self) -> FetchResult<AssetPrices>;
}
