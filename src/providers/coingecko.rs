use super::util::{build_client, decode, endpoint_url, get_text};
use crate::core::asset::{Asset, AssetPrices};
use crate::core::error::{FetchError, FetchResult};
use crate::core::price::PriceSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "CoinGecko";

/// Price source backed by the CoinGecko `simple/price` endpoint.
pub struct CoinGeckoProvider {
    base_url: String,
    timeout: Option<Duration>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        CoinGeckoProvider {
            base_url: base_url.to_string(),
            timeout,
        }
    }
}

#[derive(Deserialize, Debug)]
struct SimplePrice {
    #[serde(default)]
    usd: Option<f64>,
}

/// Keyed by asset id. Ids outside the supported set are ignored.
type SimplePriceResponse = HashMap<String, SimplePrice>;

fn extract_prices(response: SimplePriceResponse) -> FetchResult<AssetPrices> {
    let mut prices = HashMap::new();
    for asset in Asset::ALL {
        let usd = response
            .get(asset.id())
            .ok_or_else(|| FetchError::DecodeFailure(format!("missing price for {asset}")))?
            .usd
            .ok_or_else(|| FetchError::DecodeFailure(format!("missing `usd` field for {asset}")))?;
        if !usd.is_finite() || usd < 0.0 {
            return Err(FetchError::DecodeFailure(format!(
                "invalid USD price {usd} for {asset}"
            )));
        }
        prices.insert(asset, usd);
    }
    AssetPrices::try_from_map(prices)
        .map_err(|asset| FetchError::DecodeFailure(format!("missing price for {asset}")))
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoPriceFetch", skip(self))]
    async fn fetch_prices(&self) -> FetchResult<AssetPrices> {
        let client = build_client(self.timeout)?;

        let mut url = endpoint_url(&self.base_url, &["api", "v3", "simple", "price"])?;
        let ids = Asset::ALL.map(|a| a.id()).join(",");
        url.query_pairs_mut()
            .append_pair("ids", &ids)
            .append_pair("vs_currencies", "usd");

        let text = get_text(&client, url, SOURCE).await?;
        let response: SimplePriceResponse = decode(&text, SOURCE)?;
        let prices = extract_prices(response)?;

        debug!(count = prices.prices().len(), "Decoded crypto prices");
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FULL_RESPONSE: &str = r#"{
        "bitcoin": { "usd": 50000.0 },
        "ethereum": { "usd": 3000.5 },
        "litecoin": { "usd": 70.1 },
        "dogecoin": { "usd": 0.08 },
        "ripple": { "usd": 0.5 },
        "cardano": { "usd": 0.35 }
    }"#;

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param(
                "ids",
                "bitcoin,ethereum,litecoin,dogecoin,ripple,cardano",
            ))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_price_fetch() {
        let mock_server = create_mock_server(200, FULL_RESPONSE).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let prices = provider.fetch_prices().await.unwrap();
        assert_eq!(prices.prices().len(), 6);
        assert_eq!(prices.get(Asset::Bitcoin), Some(50000.0));
        assert_eq!(prices.get(Asset::Ethereum), Some(3000.5));
        assert_eq!(prices.get(Asset::Dogecoin), Some(0.08));
        assert_eq!(prices.get(Asset::Cardano), Some(0.35));
    }

    #[tokio::test]
    async fn test_extra_assets_are_ignored() {
        let body = r#"{
            "bitcoin": { "usd": 1.0 }, "ethereum": { "usd": 2.0 },
            "litecoin": { "usd": 3.0 }, "dogecoin": { "usd": 4.0 },
            "ripple": { "usd": 5.0 }, "cardano": { "usd": 6.0 },
            "solana": { "usd": 100.0 }
        }"#;
        let mock_server = create_mock_server(200, body).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let prices = provider.fetch_prices().await.unwrap();
        assert_eq!(prices.prices().len(), 6);
        assert!(prices.prices().keys().all(|a| Asset::ALL.contains(a)));
    }

    #[tokio::test]
    async fn test_missing_asset_is_decode_failure() {
        let body = r#"{
            "bitcoin": { "usd": 1.0 }, "ethereum": { "usd": 2.0 },
            "litecoin": { "usd": 3.0 }, "dogecoin": { "usd": 4.0 },
            "ripple": { "usd": 5.0 }
        }"#;
        let mock_server = create_mock_server(200, body).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_prices().await;
        assert_eq!(
            result.unwrap_err(),
            FetchError::DecodeFailure("missing price for cardano".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_usd_field_is_decode_failure() {
        let body = r#"{
            "bitcoin": { "eur": 1.0 }, "ethereum": { "usd": 2.0 },
            "litecoin": { "usd": 3.0 }, "dogecoin": { "usd": 4.0 },
            "ripple": { "usd": 5.0 }, "cardano": { "usd": 6.0 }
        }"#;
        let mock_server = create_mock_server(200, body).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_prices().await;
        assert_eq!(
            result.unwrap_err(),
            FetchError::DecodeFailure("missing `usd` field for bitcoin".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_decode_failure() {
        let mock_server = create_mock_server(200, r#"{"bitcoin": {"usd": "lots"}}"#).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_prices().await;
        assert!(matches!(result, Err(FetchError::DecodeFailure(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_data() {
        let mock_server = create_mock_server(200, "").await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_prices().await;
        assert_eq!(result.unwrap_err(), FetchError::NoData("CoinGecko".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_network_failure() {
        let mock_server = create_mock_server(500, "").await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_prices().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Network failure: HTTP error: 500 Internal Server Error from CoinGecko"
        );
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_invalid_request() {
        let provider = CoinGeckoProvider::new("not a url", None);

        let result = provider.fetch_prices().await;
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(FULL_RESPONSE)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Some(Duration::from_millis(50)));

        let result = provider.fetch_prices().await;
        assert!(matches!(result, Err(FetchError::NetworkFailure(_))));
    }
}
