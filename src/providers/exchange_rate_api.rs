use super::util::{build_client, decode, endpoint_url, get_text};
use crate::core::currency::{CurrencyCode, ExchangeRateTable, RateSource};
use crate::core::error::{FetchError, FetchResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "exchange rates API";

/// Rate source backed by the `v4/latest/{base}` endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
    timeout: Option<Duration>,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: String,
    date: String,
    rates: HashMap<String, f64>,
}

impl TryFrom<LatestRatesResponse> for ExchangeRateTable {
    type Error = FetchError;

    fn try_from(response: LatestRatesResponse) -> FetchResult<Self> {
        let base = CurrencyCode::new(response.base)
            .map_err(|e| FetchError::DecodeFailure(format!("invalid base: {e}")))?;
        let rates = response
            .rates
            .into_iter()
            .map(|(code, rate)| {
                CurrencyCode::new(code)
                    .map(|code| (code, rate))
                    .map_err(|e| FetchError::DecodeFailure(format!("invalid rate key: {e}")))
            })
            .collect::<FetchResult<HashMap<_, _>>>()?;
        Ok(ExchangeRateTable::new(base, response.date, rates))
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &CurrencyCode) -> FetchResult<ExchangeRateTable> {
        let client = build_client(self.timeout)?;
        let url = endpoint_url(&self.base_url, &["v4", "latest", base.as_str()])?;

        let text = get_text(&client, url, SOURCE).await?;
        let response: LatestRatesResponse = decode(&text, SOURCE)?;
        let table = ExchangeRateTable::try_from(response)?;

        debug!(count = table.rates.len(), date = %table.date, "Decoded exchange rates");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(base: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v4/latest/{base}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let body = r#"{
            "provider": "https://www.exchangerate-api.com",
            "base": "USD",
            "date": "2024-05-01",
            "time_last_updated": 1714521601,
            "rates": { "USD": 1, "EUR": 0.93, "JPY": 157.8, "XAU": 0.00043 }
        }"#;
        let mock_server = create_mock_server("USD", 200, body).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        let table = provider.fetch_rates(&usd()).await.unwrap();
        assert_eq!(table.base.as_str(), "USD");
        assert_eq!(table.date, "2024-05-01");
        assert_eq!(table.rates.len(), 4);
        assert_eq!(table.rate("USD"), Some(1.0));
        assert_eq!(table.rate("EUR"), Some(0.93));
        assert_eq!(table.rate("JPY"), Some(157.8));
        assert_eq!(table.rate("XAU"), Some(0.00043));
    }

    #[tokio::test]
    async fn test_base_currency_is_passed_through() {
        let body = r#"{"base": "eur", "date": "2024-05-01", "rates": {"usd": 1.07}}"#;
        let mock_server = create_mock_server("eur", 200, body).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        let table = provider
            .fetch_rates(&CurrencyCode::new("eur").unwrap())
            .await
            .unwrap();
        assert_eq!(table.base.as_str(), "eur");
        assert_eq!(table.rate("usd"), Some(1.07));
        assert_eq!(table.rate("USD"), None);
    }

    #[tokio::test]
    async fn test_missing_rates_is_decode_failure() {
        let body = r#"{"base": "USD", "date": "2024-05-01"}"#;
        let mock_server = create_mock_server("USD", 200, body).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_rates(&usd()).await;
        assert!(matches!(result, Err(FetchError::DecodeFailure(_))));
    }

    #[tokio::test]
    async fn test_empty_rate_key_is_decode_failure() {
        let body = r#"{"base": "USD", "date": "2024-05-01", "rates": {"": 1.0, "EUR": 0.9}}"#;
        let mock_server = create_mock_server("USD", 200, body).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_rates(&usd()).await;
        assert!(matches!(result, Err(FetchError::DecodeFailure(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_data() {
        let mock_server = create_mock_server("USD", 200, "  \n").await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        let result = provider.fetch_rates(&usd()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No data received from exchange rates API"
        );
    }

    #[tokio::test]
    async fn test_unknown_base_is_network_failure() {
        let mock_server = create_mock_server("USD", 200, "{}").await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), None);

        // Unmatched paths get a 404 from the mock server
        let result = provider
            .fetch_rates(&CurrencyCode::new("ZZZ").unwrap())
            .await;
        assert!(matches!(result, Err(FetchError::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let provider = ExchangeRateApiProvider::new("http://127.0.0.1:9", None);

        let result = provider.fetch_rates(&usd()).await;
        assert!(matches!(result, Err(FetchError::NetworkFailure(_))));
    }
}
