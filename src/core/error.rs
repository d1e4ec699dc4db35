//! Error types for fetches and conversions.

use crate::core::asset::Asset;
use thiserror::Error;

/// Errors raised by a price or rate fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request URL could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure, non-success status or timeout.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The response body was empty.
    #[error("No data received from {0}")]
    NoData(String),

    /// The response body did not match the expected schema.
    #[error("Failed to decode response: {0}")]
    DecodeFailure(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::NetworkFailure(err.to_string())
        }
    }
}

/// Errors raised by a conversion request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The asset price or the target rate is not cached yet.
    #[error("Invalid currencies or rates not available")]
    MissingData { asset: Asset, currency: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
