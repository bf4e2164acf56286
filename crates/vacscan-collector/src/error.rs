//! Error types for the collection engine.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the upstream or running a collection.
///
/// Pagination failures abort a run and are wrapped in
/// [`CollectError::Pagination`] so the query and stage travel with them.
/// Detail-fetch failures are record-scoped and only logged by the collector.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: String, reason: String },

    #[error("pagination failed for query '{query}' ({stage}): {source}")]
    Pagination {
        query: String,
        stage: String,
        #[source]
        source: Box<CollectError>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] vacscan_core::ConfigError),
}

impl CollectError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } => true,
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Whether the upstream asked us to slow down.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 429, .. })
    }
}

/// Why a salary could not be converted to the base currency.
///
/// Scoped to a single record: the collector nulls that record's bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error("salary has no currency")]
    MissingCurrency,

    #[error("no exchange rate for currency {0}")]
    UnknownCurrency(String),

    #[error("invalid exchange rate {rate} for currency {currency}")]
    InvalidRate { currency: String, rate: f64 },
}

pub type Result<T> = std::result::Result<T, CollectError>;
