//! vacscan Core - Foundation crate for the vacscan vacancy collector.
//!
//! This crate provides shared types, error handling and configuration
//! management that the collector and the command-line shell depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`Query`, `ExchangeRates`, `BlockedPolicy`)
//!
//! # Example
//!
//! ```rust
//! use vacscan_core::{AppConfig, ExchangeRates, Query};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.collector.effective_workers(), 1);
//!
//! let query = Query::new().with_text("rust developer").with_param("area", 1);
//! assert_eq!(query.params().len(), 2);
//!
//! let rates = ExchangeRates::from_pairs([("RUR", 1.0), ("USD", 0.0126)]);
//! assert!(rates.contains("USD"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, CollectorConfig, QueryConfig, RetryConfig, BASE_CURRENCY};
pub use error::{ConfigError, ConfigResult, Result, VacscanError};
pub use types::{BlockedPolicy, ExchangeRates, Query};
