use crate::core::error::{FetchError, FetchResult};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("coinconv/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client. No request timeout unless one is given.
pub fn build_client(timeout: Option<Duration>) -> FetchResult<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(FetchError::from_reqwest)
}

/// Appends `segments` to `base_url`, percent-encoding each one.
pub fn endpoint_url(base_url: &str, segments: &[&str]) -> FetchResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| FetchError::InvalidRequest(format!("{e} for base URL: {base_url}")))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidRequest(format!("Cannot append path to {base_url}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends a GET and returns the body, mapping an empty body to `NoData`.
pub async fn get_text(client: &Client, url: Url, source: &str) -> FetchResult<String> {
    debug!(%url, "Requesting {source}");
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::NetworkFailure(format!("Request to {source} timed out"))
        } else {
            FetchError::from_reqwest(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::NetworkFailure(format!(
            "HTTP error: {status} from {source}"
        )));
    }

    let text = response.text().await.map_err(FetchError::from_reqwest)?;
    if text.trim().is_empty() {
        return Err(FetchError::NoData(source.to_string()));
    }
    Ok(text)
}

pub fn decode<T: DeserializeOwned>(text: &str, source: &str) -> FetchResult<T> {
    serde_json::from_str(text)
        .map_err(|e| FetchError::DecodeFailure(format!("{source} response: {e}")))
}
