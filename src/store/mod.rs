//! Session state shared with the presentation layer.
//!
//! A [`ConversionStore`] is a cheap, cloneable handle. All mutation happens
//! on a single owner task which receives fetch results and conversion
//! requests over a channel, so network I/O never runs on the owner and
//! consumers stay responsive while fetches are outstanding.
//!
//! Each published field is a separate [`watch`] channel and is always
//! replaced as a whole value. Nothing is published atomically across
//! fields: a reader may see fresh prices next to a stale rate table.

pub mod state;

use crate::core::asset::{Asset, AssetPrices};
use crate::core::config::AppConfig;
use crate::core::conversion::ConversionRequest;
use crate::core::currency::{CurrencyCode, ExchangeRateTable, RateSource};
use crate::core::error::{ConversionError, FetchResult};
use crate::core::price::PriceSource;
use crate::providers::{CoinGeckoProvider, ExchangeRateApiProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use state::StoreState;

enum Command {
    PricesFetched {
        result: FetchResult<AssetPrices>,
        done: oneshot::Sender<()>,
    },
    RatesFetched {
        result: FetchResult<ExchangeRateTable>,
        done: oneshot::Sender<()>,
    },
    Convert {
        request: ConversionRequest,
        reply: oneshot::Sender<Result<f64, ConversionError>>,
    },
}

struct Publishers {
    crypto_prices: watch::Sender<Option<AssetPrices>>,
    exchange_rates: watch::Sender<Option<ExchangeRateTable>>,
    converted_prices: watch::Sender<HashMap<Asset, f64>>,
    error_message: watch::Sender<Option<String>>,
}

/// Replaces the published value only when it differs, so receivers are not
/// woken for fields a command did not touch.
fn publish_changed<T: Clone + PartialEq>(tx: &watch::Sender<T>, value: &T) {
    tx.send_if_modified(|current| {
        if current != value {
            *current = value.clone();
            true
        } else {
            false
        }
    });
}

impl Publishers {
    /// `error_written` forces a notification on `error_message`, so a failure
    /// repeating the previous text still wakes its watchers.
    fn publish(&self, state: &StoreState, error_written: bool) {
        publish_changed(&self.crypto_prices, &state.crypto_prices);
        publish_changed(&self.exchange_rates, &state.exchange_rates);
        publish_changed(&self.converted_prices, &state.converted_prices);
        if error_written {
            self.error_message.send_replace(state.error_message.clone());
        } else {
            publish_changed(&self.error_message, &state.error_message);
        }
    }
}

async fn run_owner(mut commands: mpsc::UnboundedReceiver<Command>, publishers: Publishers) {
    let mut state = StoreState::default();

    while let Some(command) = commands.recv().await {
        match command {
            Command::PricesFetched { result, done } => {
                let failed = result.is_err();
                state.apply_prices(result);
                publishers.publish(&state, failed);
                let _ = done.send(());
            }
            Command::RatesFetched { result, done } => {
                let failed = result.is_err();
                state.apply_rates(result);
                publishers.publish(&state, failed);
                let _ = done.send(());
            }
            Command::Convert { request, reply } => {
                let result = state.convert(request.asset, request.amount, &request.currency);
                publishers.publish(&state, result.is_err());
                let _ = reply.send(result);
            }
        }
    }
    debug!("All store handles dropped, owner task exiting");
}

/// Handle to the fetches started by [`ConversionStore::initialize`].
///
/// Dropping it does not cancel anything.
pub struct Initialization {
    prices: JoinHandle<()>,
    rates: JoinHandle<()>,
}

impl Initialization {
    /// Resolves once both fetch results have been applied to the store,
    /// whichever order they complete in.
    pub async fn wait(self) {
        let (prices, rates) = futures::future::join(self.prices, self.rates).await;
        for (name, joined) in [("prices", prices), ("rates", rates)] {
            if let Err(e) = joined {
                warn!(error = %e, "Initial {name} fetch task did not finish");
            }
        }
    }
}

#[derive(Clone)]
pub struct ConversionStore {
    commands: mpsc::UnboundedSender<Command>,
    price_source: Arc<dyn PriceSource>,
    rate_source: Arc<dyn RateSource>,
    crypto_prices: watch::Receiver<Option<AssetPrices>>,
    exchange_rates: watch::Receiver<Option<ExchangeRateTable>>,
    converted_prices: watch::Receiver<HashMap<Asset, f64>>,
    error_message: watch::Receiver<Option<String>>,
}

impl ConversionStore {
    /// Creates the store and spawns its owner task. Must be called from
    /// within a Tokio runtime.
    pub fn new(price_source: Arc<dyn PriceSource>, rate_source: Arc<dyn RateSource>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (crypto_prices_tx, crypto_prices) = watch::channel(None);
        let (exchange_rates_tx, exchange_rates) = watch::channel(None);
        let (converted_prices_tx, converted_prices) = watch::channel(HashMap::new());
        let (error_message_tx, error_message) = watch::channel(None);

        tokio::spawn(run_owner(
            rx,
            Publishers {
                crypto_prices: crypto_prices_tx,
                exchange_rates: exchange_rates_tx,
                converted_prices: converted_prices_tx,
                error_message: error_message_tx,
            },
        ));

        Self {
            commands,
            price_source,
            rate_source,
            crypto_prices,
            exchange_rates,
            converted_prices,
            error_message,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = config.request_timeout();
        let price_source = CoinGeckoProvider::new(config.coingecko_base_url(), timeout);
        let rate_source = ExchangeRateApiProvider::new(config.exchange_rates_base_url(), timeout);
        Self::new(Arc::new(price_source), Arc::new(rate_source))
    }

    /// Starts the price and rate fetches concurrently and returns at once.
    /// There is no ordering between the two. Rates are always requested
    /// against USD, the currency prices are quoted in.
    pub fn initialize(&self) -> Initialization {
        info!("Initializing conversion store");

        let store = self.clone();
        let prices = tokio::spawn(async move {
            let _ = store.fetch_crypto_prices().await;
        });

        let store = self.clone();
        let rates = tokio::spawn(async move {
            let _ = store.fetch_exchange_rates(&CurrencyCode::usd()).await;
        });

        Initialization { prices, rates }
    }

    /// Fetches prices on the calling task and resolves after the owner has
    /// applied the result. The store state, not the return value, is the
    /// record of what happened.
    pub async fn fetch_crypto_prices(&self) -> FetchResult<()> {
        let result = self.price_source.fetch_prices().await;
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.clone());

        let (done, applied) = oneshot::channel();
        self.submit(Command::PricesFetched { result, done }, applied)
            .await;
        outcome
    }

    pub async fn fetch_exchange_rates(&self, base: &CurrencyCode) -> FetchResult<()> {
        let result = self.rate_source.fetch_rates(base).await;
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.clone());

        let (done, applied) = oneshot::channel();
        self.submit(Command::RatesFetched { result, done }, applied)
            .await;
        outcome
    }

    async fn submit(&self, command: Command, applied: oneshot::Receiver<()>) {
        if self.commands.send(command).is_err() || applied.await.is_err() {
            warn!("Store owner task is gone, fetch result dropped");
        }
    }

    /// Converts `amount` units of `asset` into `currency` using whatever is
    /// cached right now. Never triggers a fetch.
    pub async fn convert_crypto_price(
        &self,
        asset: Asset,
        amount: f64,
        currency: &CurrencyCode,
    ) -> Result<f64, ConversionError> {
        self.request_conversion(ConversionRequest {
            asset,
            amount,
            currency: currency.clone(),
        })
        .await
    }

    pub async fn request_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<f64, ConversionError> {
        let missing = ConversionError::MissingData {
            asset: request.asset,
            currency: request.currency.to_string(),
        };
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Convert { request, reply })
            .is_err()
        {
            warn!("Store owner task is gone, conversion not applied");
            return Err(missing);
        }
        response.await.unwrap_or_else(|_| {
            warn!("Store owner task is gone, conversion not applied");
            Err(missing)
        })
    }

    pub fn crypto_prices(&self) -> watch::Receiver<Option<AssetPrices>> {
        self.crypto_prices.clone()
    }

    pub fn exchange_rates(&self) -> watch::Receiver<Option<ExchangeRateTable>> {
        self.exchange_rates.clone()
    }

    pub fn converted_prices(&self) -> watch::Receiver<HashMap<Asset, f64>> {
        self.converted_prices.clone()
    }

    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.error_message.clone()
    }

    /// Reads each field in turn. Fields are individually consistent but may
    /// come from different moments.
    pub fn snapshot(&self) -> StoreState {
        StoreState {
            crypto_prices: self.crypto_prices.borrow().clone(),
            exchange_rates: self.exchange_rates.borrow().clone(),
            converted_prices: self.converted_prices.borrow().clone(),
            error_message: self.error_message.borrow().clone(),
        }
    }
}
