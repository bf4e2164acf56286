//! Detail-record retrieval for a single vacancy.

use crate::api::{ListingApi, Named, VacancyDetail};
use crate::error::Result;
use crate::record::VacancyRecord;
use crate::retry::RetryPolicy;
use crate::salary::{normalize_salary, SalaryBounds};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use vacscan_core::{BlockedPolicy, ExchangeRates};

/// Remove every `<...>` span. Tags are not parsed, so nested or malformed
/// markup is stripped span by span and entities are left as they are.
pub fn strip_markup(html: &str) -> String {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TAG_REGEX.get_or_init(|| Regex::new(r"<.*?>").expect("valid regex"));
    regex.replace_all(html, "").into_owned()
}

/// Fetches one vacancy and turns it into a [`VacancyRecord`].
pub struct VacancyFetcher {
    api: Arc<dyn ListingApi>,
    rates: Arc<ExchangeRates>,
    retry: RetryPolicy,
    blocked_policy: BlockedPolicy,
}

impl VacancyFetcher {
    pub fn new(api: Arc<dyn ListingApi>, rates: Arc<ExchangeRates>) -> Self {
        Self {
            api,
            rates,
            retry: RetryPolicy::default(),
            blocked_policy: BlockedPolicy::default(),
        }
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

    /// Fetch vacancy `id`.
    ///
    /// Returns `Ok(None)` when the upstream blocked the request and the policy
    /// says to skip it. Transport errors that outlast the retry policy are
    /// returned; the caller drops that record.
    pub async fn fetch(&self, id: &str) -> Result<Option<VacancyRecord>> {
        let mut detail = self.request(id).await?;

        if detail.is_blocked() {
            tracing::warn!(
                "Vacancy {} blocked by upstream (captcha required?), policy: {}",
                id,
                self.blocked_policy
            );
            match self.blocked_policy {
                BlockedPolicy::Skip => return Ok(None),
                BlockedPolicy::Degrade => {}
                BlockedPolicy::Retry => detail = self.retry_blocked(id, detail).await,
            }
        }

        Ok(Some(self.build_record(id, detail)))
    }

    async fn request(&self, id: &str) -> Result<VacancyDetail> {
        let api = &self.api;
        self.retry
            .run(&format!("vacancy {id}"), move || api.vacancy(id))
            .await
    }

    /// Re-request a blocked vacancy with rate-limit backoff. Falls back to the
    /// blocked payload when every attempt is blocked or a re-request fails.
    async fn retry_blocked(&self, id: &str, blocked: VacancyDetail) -> VacancyDetail {
        for attempt in 1..self.retry.max_attempts() {
            let delay = self.retry.delay_for(attempt - 1, true);
            tracing::debug!("Retrying blocked vacancy {} in {:?}", id, delay);
            tokio::time::sleep(delay).await;

            match self.request(id).await {
                Ok(detail) if !detail.is_blocked() => return detail,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Retry of blocked vacancy {} failed: {}, keeping degraded record",
                        id,
                        e
                    );
                    return blocked;
                }
            }
        }

        tracing::warn!("Vacancy {} still blocked, keeping degraded record", id);
        blocked
    }

    /// Build the record: normalize the salary, strip description markup, and
    /// fill absent fields with empty values.
    pub fn build_record(&self, id: &str, detail: VacancyDetail) -> VacancyRecord {
        let bounds = match &detail.salary {
            Some(salary) => normalize_salary(salary, &self.rates).unwrap_or_else(|e| {
                tracing::warn!("Salary of vacancy {} not normalized: {}", id, e);
                SalaryBounds::default()
            }),
            None => SalaryBounds::default(),
        };

        VacancyRecord {
            id: id.to_string(),
            employer: name_of(detail.employer),
            name: detail.name.unwrap_or_default(),
            has_salary: bounds.is_present(),
            salary_from: bounds.from,
            salary_to: bounds.to,
            experience: name_of(detail.experience),
            schedule: name_of(detail.schedule),
            key_skills: detail
                .key_skills
                .unwrap_or_default()
                .into_iter()
                .filter_map(|skill| skill.name)
                .collect(),
            description: strip_markup(detail.description.as_deref().unwrap_or_default()),
        }
    }
}

fn name_of(named: Option<Named>) -> String {
    named.and_then(|n| n.name).unwrap_or_default()
}
