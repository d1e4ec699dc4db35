use crate::core::asset::{Asset, AssetPrices};
use crate::core::conversion::convert;
use crate::core::currency::{CurrencyCode, ExchangeRateTable};
use crate::core::error::{ConversionError, FetchResult};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Everything the store publishes. Only the owner task mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub crypto_prices: Option<AssetPrices>,
    pub exchange_rates: Option<ExchangeRateTable>,
    pub converted_prices: HashMap<Asset, f64>,
    pub error_message: Option<String>,
}

impl StoreState {
    /// Replaces the prices on success. A failure only overwrites the error
    /// message and keeps whatever prices were cached before.
    pub fn apply_prices(&mut self, result: FetchResult<AssetPrices>) {
        match result {
            Ok(prices) => {
                debug!(count = prices.prices().len(), "Caching crypto prices");
                self.crypto_prices = Some(prices);
            }
            Err(e) => {
                warn!(error = %e, "Crypto price fetch failed");
                self.error_message = Some(format!("Failed to fetch crypto prices: {e}"));
            }
        }
    }

    /// Same policy as [`StoreState::apply_prices`], for the rate table.
    pub fn apply_rates(&mut self, result: FetchResult<ExchangeRateTable>) {
        match result {
            Ok(table) => {
                debug!(base = %table.base, count = table.rates.len(), "Caching exchange rates");
                self.exchange_rates = Some(table);
            }
            Err(e) => {
                warn!(error = %e, "Exchange rate fetch failed");
                self.error_message = Some(format!("Failed to fetch exchange rates: {e}"));
            }
        }
    }

    /// Converts from the currently cached snapshot and records the result for
    /// `asset`. Existing entries for other assets are left as they were.
    pub fn convert(
        &mut self,
        asset: Asset,
        amount: f64,
        currency: &CurrencyCode,
    ) -> Result<f64, ConversionError> {
        let price = self.crypto_prices.as_ref().and_then(|p| p.get(asset));
        let rate = self
            .exchange_rates
            .as_ref()
            .and_then(|t| t.rate(currency.as_str()));

        match (price, rate) {
            (Some(price), Some(rate)) => {
                let value = convert(price, amount, rate);
                debug!(%asset, %currency, amount, value, "Converted price");
                self.converted_prices.insert(asset, value);
                Ok(value)
            }
            _ => {
                let err = ConversionError::MissingData {
                    asset,
                    currency: currency.to_string(),
                };
                warn!(
                    %asset,
                    %currency,
                    has_price = price.is_some(),
                    has_rate = rate.is_some(),
                    "Conversion data not available"
                );
                self.error_message = Some(err.to_string());
                Err(err)
            }
        }
    }
}
