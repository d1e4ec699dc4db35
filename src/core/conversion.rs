//! Converting a cached USD price into a target currency

use crate::core::asset::Asset;
use crate::core::currency::CurrencyCode;

/// Plain floating point product of the three inputs, no rounding applied.
pub fn convert(asset_price_usd: f64, amount: f64, rate: f64) -> f64 {
    asset_price_usd * amount * rate
}

/// Parses a user supplied amount. Anything that is not a finite number
/// falls back to a single unit.
pub fn parse_amount(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub asset: Asset,
    pub amount: f64,
    pub currency: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(asset: Asset, amount_input: &str, currency: CurrencyCode) -> Self {
        Self {
            asset,
            amount: parse_amount(amount_input),
            currency,
        }
    }
}
