//! Supported crypto assets and their USD price snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Bitcoin,
    Ethereum,
    Litecoin,
    Dogecoin,
    Ripple,
    Cardano,
}

impl Asset {
    pub const ALL: [Asset; 6] = [
        Asset::Bitcoin,
        Asset::Ethereum,
        Asset::Litecoin,
        Asset::Dogecoin,
        Asset::Ripple,
        Asset::Cardano,
    ];

    /// Identifier used by the price endpoint, e.g. `bitcoin`.
    pub fn id(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "bitcoin",
            Asset::Ethereum => "ethereum",
            Asset::Litecoin => "litecoin",
            Asset::Dogecoin => "dogecoin",
            Asset::Ripple => "ripple",
            Asset::Cardano => "cardano",
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTC",
            Asset::Ethereum => "ETH",
            Asset::Litecoin => "LTC",
            Asset::Dogecoin => "DOGE",
            Asset::Ripple => "XRP",
            Asset::Cardano => "ADA",
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Asset {
    type Err = anyhow::Error;

    /// Accepts either the lowercase identifier or the ticker, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Asset::ALL
            .into_iter()
            .find(|a| {
                a.id().eq_ignore_ascii_case(needle) || a.ticker().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown asset: {}", s))
    }
}

/// USD prices for every supported asset, as of `fetched_at`.
///
/// Only constructed from a complete response, so a value of this type always
/// carries exactly one price per [`Asset`]. Deserialization goes through the
/// same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssetPricesRecord")]
pub struct AssetPrices {
    prices: HashMap<Asset, f64>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AssetPricesRecord {
    prices: HashMap<Asset, f64>,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<AssetPricesRecord> for AssetPrices {
    type Error = String;

    fn try_from(record: AssetPricesRecord) -> Result<Self, Self::Error> {
        let mut prices = Self::try_from_map(record.prices)
            .map_err(|missing| format!("missing price for {missing}"))?;
        prices.fetched_at = record.fetched_at;
        Ok(prices)
    }
}

impl AssetPrices {
    /// Builds a snapshot from per-asset prices. Returns the first missing
    /// asset if `prices` does not cover the whole asset set.
    pub fn try_from_map(prices: HashMap<Asset, f64>) -> Result<Self, Asset> {
        if let Some(missing) = Asset::ALL.into_iter().find(|a| !prices.contains_key(a)) {
            return Err(missing);
        }
        Ok(Self {
            prices,
            fetched_at: Utc::now(),
        })
    }

    pub fn get(&self, asset: Asset) -> Option<f64> {
        self.prices.get(&asset).copied()
    }

    /// Iterates in [`Asset::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Asset, f64)> + '_ {
        Asset::ALL
            .into_iter()
            .filter_map(|a| self.prices.get(&a).map(|p| (a, *p)))
    }

    pub fn prices(&self) -> &HashMap<Asset, f64> {
        &self.prices
    }
}
