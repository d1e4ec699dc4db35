//! Currency codes, exchange rate snapshots and the rate source abstraction

use crate::core::error::FetchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// A currency code as returned by the rates endpoint.
///
/// Codes are case-sensitive and never empty. No check is made against a list
/// of known currencies; the set of codes is whatever the remote returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> anyhow::Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            anyhow::bail!("Currency code must not be empty");
        }
        Ok(Self(code))
    }

    /// The quote currency of every price snapshot. Conversions assume the
    /// cached rate table is based on it.
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

/// Exchange rates relative to `base`, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    pub base: CurrencyCode,
    pub date: String,
    pub rates: HashMap<CurrencyCode, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRateTable {
    pub fn new(base: CurrencyCode, date: String, rates: HashMap<CurrencyCode, f64>) -> Self {
        Self {
            base,
            date,
            rates,
            fetched_at: Utc::now(),
        }
    }

    /// Lookup by exact, case-sensitive code.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Rates sorted by currency code.
    pub fn sorted(&self) -> Vec<(&CurrencyCode, f64)> {
        let mut rates: Vec<_> = self.rates.iter().map(|(c, r)| (c, *r)).collect();
        rates.sort_by(|a, b| a.0.cmp(b.0));
        rates
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self, base: &CurrencyCode) -> FetchResult<ExchangeRateTable>;
}
