pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::asset::Asset;
use crate::core::config::AppConfig;
use crate::core::conversion::parse_amount;
use crate::core::currency::CurrencyCode;
use crate::store::ConversionStore;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Prices {
        currency: Option<String>,
        amount: Option<String>,
    },
    Rates {
        filter: Vec<String>,
    },
    Convert {
        asset: Asset,
        amount: Option<String>,
        currency: Option<String>,
    },
}

fn target_currency(requested: Option<String>, config: &AppConfig) -> Result<CurrencyCode> {
    match requested {
        Some(code) => CurrencyCode::new(code),
        None => config.target_currency(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = ConversionStore::from_config(&config);

    match command {
        AppCommand::Prices { currency, amount } => {
            let currency = target_currency(currency, &config)?;
            let amount = parse_amount(amount.as_deref().unwrap_or_default());
            cli::prices::run(&store, &currency, amount).await
        }
        AppCommand::Rates { filter } => {
            cli::rates::run(&store, &config.base_currency()?, &filter).await
        }
        AppCommand::Convert {
            asset,
            amount,
            currency,
        } => {
            let currency = target_currency(currency, &config)?;
            let amount = parse_amount(amount.as_deref().unwrap_or_default());
            cli::convert::run(&store, asset, amount, &currency).await
        }
    }
}
