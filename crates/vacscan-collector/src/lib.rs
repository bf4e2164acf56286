//! vacscan Collector - Vacancy collection engine.
//!
//! This crate turns a search query and an exchange-rate table into a
//! column-oriented table of vacancies from the hh.ru API, with an on-disk
//! cache that makes repeated queries cheap.
//!
//! # Features
//!
//! - Canonical query encoding shared by requests and cache keys
//! - Page walking that tolerates an inconsistent page count
//! - Bounded, paced concurrent detail fetching that keeps id order
//! - Retry logic with linear backoff and per-request timeouts
//! - Salary normalization into the base currency, net of tax
//! - Configurable handling of captcha/blocked responses
//! - Versioned, content-addressed result cache
//!
//! # Example
//!
//! ```rust,ignore
//! use vacscan_collector::{CacheStore, HhClient, VacancyCollector};
//! use vacscan_core::{AppConfig, Query};
//! use std::sync::Arc;
//!
//! let config = AppConfig::load_with_env()?;
//! let api = Arc::new(HhClient::from_config(&config.collector)?);
//! let collector = VacancyCollector::from_config(api, &config)?.with_workers(4);
//!
//! let query = Query::new().with_text("rust").with_professional_roles([96]);
//! let result = collector.collect(&query, false).await?;
//! println!("{} vacancies", result.len());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod assembler;
pub mod cache;
pub mod collector;
pub mod error;
pub mod fetcher;
pub mod paginator;
pub mod pool;
pub mod query;
pub mod record;
pub mod retry;
pub mod salary;

// Re-export commonly used types
pub use api::{HhClient, ListingApi, SearchPage, VacancyDetail};
pub use assembler::{CollectionResult, Column, FIELD_NAMES};
pub use cache::{cache_key, CacheStore, CachedResult};
pub use collector::VacancyCollector;
pub use error::{CollectError, NormalizationError, Result};
pub use fetcher::{strip_markup, VacancyFetcher};
pub use paginator::ListingPaginator;
pub use pool::OrderedPool;
pub use query::encode_query;
pub use record::VacancyRecord;
pub use retry::RetryPolicy;
pub use salary::{normalize_salary, SalaryBounds};
