//! Collection orchestrator.
//!
//! This module provides the [`VacancyCollector`] which runs a query end to end:
//! canonical encoding, cache lookup, pagination, paced concurrent detail
//! fetching, assembly into a [`CollectionResult`] and cache write-back.

use crate::api::ListingApi;
use crate::assembler::CollectionResult;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::fetcher::VacancyFetcher;
use crate::paginator::ListingPaginator;
use crate::pool::OrderedPool;
use crate::query::encode_query;
use crate::record::VacancyRecord;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use vacscan_core::{AppConfig, BlockedPolicy, ExchangeRates, Query};

/// Default delay after each completed detail fetch.
const DEFAULT_PACING_MS: u64 = 250;

/// Runs vacancy collections against one upstream with one cache.
pub struct VacancyCollector {
    /// Upstream listing service
    api: Arc<dyn ListingApi>,
    /// Result cache
    cache: CacheStore,
    /// Currency conversion table for salary normalization
    rates: Arc<ExchangeRates>,
    /// Maximum concurrent detail fetches
    workers: usize,
    /// Delay after each completed detail fetch
    pacing: Duration,
    /// Retry policy for every upstream request
    retry: RetryPolicy,
    /// Handling of blocked detail responses
    blocked_policy: BlockedPolicy,
}

impl VacancyCollector {
    /// Create a collector with one worker and default pacing and retries.
    #[must_use]
    pub fn new(api: Arc<dyn ListingApi>, cache: CacheStore, rates: ExchangeRates) -> Self {
        Self {
            api,
            cache,
            rates: Arc::new(rates),
            workers: 1,
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            retry: RetryPolicy::default(),
            blocked_policy: BlockedPolicy::default(),
        }
    }

    /// Create a collector from application configuration.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be determined.
    pub fn from_config(api: Arc<dyn ListingApi>, config: &AppConfig) -> Result<Self> {
        let collector = &config.collector;
        let retry = RetryPolicy::from_config(&collector.retry)
            .with_attempt_timeout(Duration::from_secs(collector.request_timeout_secs));

        Ok(
            Self::new(api, CacheStore::new(config.cache_dir()?), config.rates.clone())
                .with_workers(collector.effective_workers())
                .with_pacing(Duration::from_millis(collector.pacing_ms))
                .with_retry_policy(retry)
                .with_blocked_policy(collector.blocked_policy),
        )
    }

    /// Set the maximum number of concurrent detail fetches (at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the delay imposed after each completed detail fetch.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_blocked_policy(mut self, policy: BlockedPolicy) -> Self {
        self.blocked_policy = policy;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Collect every vacancy matching `query`.
    ///
    /// Unless `refresh` is set, a cached result for the same canonical query
    /// is returned without touching the upstream. Otherwise the full pipeline
    /// runs and its result replaces the cache entry.
    ///
    /// # Errors
    /// Fails only if pagination fails; individual vacancies that cannot be
    /// fetched are logged and left out of the result.
    pub async fn collect(&self, query: &Query, refresh: bool) -> Result<CollectionResult> {
        self.collect_canonical(&encode_query(query), refresh).await
    }

    /// Same as [`collect`](Self::collect) for an already encoded query string.
    pub async fn collect_canonical(
        &self,
        canonical: &str,
        refresh: bool,
    ) -> Result<CollectionResult> {
        if refresh {
            tracing::info!("Refresh requested, bypassing cache for '{}'", canonical);
        } else if let Some(cached) = self.cache.lookup(canonical).await {
            tracing::info!(
                "Using {} cached vacancies for '{}' (enable refresh to re-collect)",
                cached.len(),
                canonical
            );
            return Ok(cached);
        }

        let ids = ListingPaginator::new(self.api.clone(), self.retry.clone())
            .collect_ids(canonical)
            .await?;

        let records = self.fetch_all(ids).await;
        let result = CollectionResult::from_records(records);
        tracing::info!("Collected {} vacancies for '{}'", result.len(), canonical);

        if let Err(e) = self.cache.store(canonical, &result).await {
            tracing::error!("Failed to cache results for '{}': {}", canonical, e);
        }

        Ok(result)
    }

    /// Fetch all `ids` through the worker pool, keeping id order and dropping
    /// vacancies that failed or were skipped.
    async fn fetch_all(&self, ids: Vec<String>) -> Vec<VacancyRecord> {
        let fetcher = Arc::new(
            VacancyFetcher::new(self.api.clone(), self.rates.clone())
                .with_retry_policy(self.retry.clone())
                .with_blocked_policy(self.blocked_policy),
        );
        let pool = OrderedPool::new(self.workers, self.pacing);
        tracing::info!(
            "Fetching {} vacancies with {} workers",
            ids.len(),
            pool.workers()
        );

        let outcomes = pool
            .run(ids, move |id| {
                let fetcher = fetcher.clone();
                async move {
                    let outcome = fetcher.fetch(&id).await;
                    (id, outcome)
                }
            })
            .await;

        outcomes
            .into_iter()
            .flatten()
            .filter_map(|(id, outcome)| match outcome {
                Ok(Some(record)) => Some(record),
                Ok(None) => {
                    tracing::debug!("Vacancy {} skipped", id);
                    None
                }
                Err(e) => {
                    tracing::error!("Failed to fetch vacancy {}: {}", id, e);
                    None
                }
            })
            .collect()
    }
}
