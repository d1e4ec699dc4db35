use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com";
pub const DEFAULT_EXCHANGE_RATES_URL: &str = "https://api.exchangerate-api.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRatesProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub exchange_rates: Option<ExchangeRatesProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: DEFAULT_COINGECKO_URL.to_string(),
            }),
            exchange_rates: Some(ExchangeRatesProviderConfig {
                base_url: DEFAULT_EXCHANGE_RATES_URL.to_string(),
            }),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_currency")]
    pub base_currency: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            base_currency: default_currency(),
            request_timeout_secs: None,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or falls back to defaults
    /// when no file has been created there yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "coinconv", "coinconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn coingecko_base_url(&self) -> &str {
        self.providers
            .coingecko
            .as_ref()
            .map_or(DEFAULT_COINGECKO_URL, |p| &p.base_url)
    }

    pub fn exchange_rates_base_url(&self) -> &str {
        self.providers
            .exchange_rates
            .as_ref()
            .map_or(DEFAULT_EXCHANGE_RATES_URL, |p| &p.base_url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn target_currency(&self) -> Result<CurrencyCode> {
        CurrencyCode::new(self.currency.as_str()).context("Invalid `currency` in config")
    }

    pub fn base_currency(&self) -> Result<CurrencyCode> {
        CurrencyCode::new(self.base_currency.as_str()).context("Invalid `base_currency` in config")
    }
}
