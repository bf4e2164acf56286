//! Shared types used across vacscan.
//!
//! This module defines the search query model, the exchange-rate table the
//! collector consumes, and the policy enum for blocked upstream responses.

use crate::error::{Result, VacscanError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// A vacancy search query.
///
/// The professional-role filter is multi-valued and kept apart from the
/// scalar filters, which preserve insertion order so that encoding the same
/// builder sequence always yields the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    professional_roles: Vec<String>,
    params: Vec<(String, String)>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text search filter.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_param("text", text.into())
    }

    /// Set a scalar filter. An existing filter with the same name keeps its
    /// position and takes the new value.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// Add professional-role filter values.
    #[must_use]
    pub fn with_professional_roles<I, T>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.professional_roles
            .extend(roles.into_iter().map(|role| role.to_string()));
        self
    }

    /// Professional-role filter values in the order they were added.
    #[must_use]
    pub fn professional_roles(&self) -> &[String] {
        &self.professional_roles
    }

    /// Scalar filters in insertion order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// True when no filter of any kind is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.professional_roles.is_empty() && self.params.is_empty()
    }
}

/// Currency conversion table keyed by 3-letter currency code.
///
/// Each value is the divisor that converts an amount in that currency into the
/// base currency: `base = amount / rate`. The base currency itself maps to `1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates(BTreeMap<String, f64>);

impl ExchangeRates {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(code, rate)` pairs without validation.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Insert or replace a rate.
    ///
    /// # Errors
    /// Returns error if the code is not three uppercase letters or the rate is
    /// not a positive finite number.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) -> Result<()> {
        let code = code.into();
        Self::validate_entry(&code, rate)?;
        self.0.insert(code, rate);
        Ok(())
    }

    /// Look up the rate for a currency code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    /// True when the table has a rate for `code`.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    /// Number of currencies in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every entry, e.g. after loading from a config file.
    pub fn validate(&self) -> Result<()> {
        self.0
            .iter()
            .try_for_each(|(code, rate)| Self::validate_entry(code, *rate))
    }

    fn validate_entry(code: &str, rate: f64) -> Result<()> {
        static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = CODE_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("valid regex"));

        if !regex.is_match(code) {
            return Err(VacscanError::Validation(format!(
                "invalid currency code: must be 3 uppercase letters, got '{code}'"
            )));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(VacscanError::Validation(format!(
                "invalid rate for {code}: must be a positive number, got {rate}"
            )));
        }
        Ok(())
    }
}

/// What to do when the detail endpoint answers with an error payload
/// (captcha or block) instead of a vacancy body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedPolicy {
    /// Keep a record built from whatever fields the payload carried.
    #[default]
    Degrade,
    /// Drop the record from the result.
    Skip,
    /// Retry under the retry policy, then degrade.
    Retry,
}

impl fmt::Display for BlockedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Degrade => "degrade",
            Self::Skip => "skip",
            Self::Retry => "retry",
        };
        write!(f, "{name}")
    }
}
