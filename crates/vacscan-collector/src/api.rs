//! Upstream listing service: response shapes, the [`ListingApi`] seam and
//! its HTTP implementation.

use crate::error::{CollectError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vacscan_core::CollectorConfig;

/// One page of the search endpoint.
///
/// The first (unpaged) request is only read for `pages`; paged requests are
/// read for `items`, whose absence ends pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub items: Option<Vec<ItemRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
}

/// Detail record as returned by `GET <base>/<id>`.
///
/// Every field is optional so that captcha and error payloads still parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VacancyDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    pub employer: Option<Named>,
    pub salary: Option<Salary>,
    pub experience: Option<Named>,
    pub schedule: Option<Named>,
    pub key_skills: Option<Vec<Named>>,
    pub description: Option<String>,
    pub errors: Option<serde_json::Value>,
}

impl VacancyDetail {
    /// True when the upstream sent an error indicator instead of a body.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.errors.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Salary {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub currency: Option<String>,
    pub gross: Option<bool>,
}

/// Access to the upstream listing service.
///
/// `search` receives a full query string (canonical query plus an optional
/// `page` parameter). Implementations must be thread-safe; the collector
/// shares one instance across all fetch workers.
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchPage>;

    async fn vacancy(&self, id: &str) -> Result<VacancyDetail>;
}

/// HTTP client for the hh.ru vacancies API.
pub struct HhClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HhClient {
    /// Create a client for `base_url` (the vacancies endpoint, with trailing slash).
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Create a client from collector settings.
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}?{}", self.base_url, query)
    }

    fn vacancy_url(&self, id: &str) -> String {
        format!("{}{}", self.base_url, id)
    }

    /// GET a JSON document. 429 and 5xx are errors; any other status has its
    /// body interpreted, since the upstream reports captcha and paging limits
    /// as JSON error bodies.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CollectError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                CollectError::Network(e)
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(CollectError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CollectError::UnexpectedResponse {
            url: url.to_string(),
            reason: format!("invalid JSON (HTTP {}): {e}", status.as_u16()),
        })
    }
}

#[async_trait]
impl ListingApi for HhClient {
    async fn search(&self, query: &str) -> Result<SearchPage> {
        self.get_json(&self.search_url(query)).await
    }

    async fn vacancy(&self, id: &str) -> Result<VacancyDetail> {
        self.get_json(&self.vacancy_url(id)).await
    }
}
