//! Core domain types and abstractions

pub mod asset;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use asset::{Asset, AssetPrices};
pub use conversion::{ConversionRequest, convert, parse_amount};
pub use currency::{CurrencyCode, ExchangeRateTable, RateSource};
pub use error::{ConversionError, FetchError, FetchResult};
pub use price::PriceSource;
