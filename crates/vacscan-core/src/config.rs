//! Configuration management for vacscan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{BlockedPolicy, ExchangeRates, Query};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Currency that salaries are normalized into.
pub const BASE_CURRENCY: &str = "RUR";

/// Main application configuration.
///
/// This is loaded from `~/.config/vacscan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Collection engine settings
    pub collector: CollectorConfig,
    /// Search query to run
    pub query: QueryConfig,
    /// Currency conversion table consumed by salary normalization
    pub rates: ExchangeRates,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            query: QueryConfig::default(),
            rates: ExchangeRates::from_pairs([(BASE_CURRENCY, 1.0)]),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        let config: Self = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config
            .rates
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "rates".to_string(),
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `VACSCAN_WORKERS`: Override worker count
    /// - `VACSCAN_REFRESH`: Override the refresh flag (true/false)
    /// - `VACSCAN_CACHE_DIR`: Override the cache directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    /// Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("VACSCAN_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.collector.workers = workers;
                tracing::debug!("Override collector.workers from env: {}", workers);
            }
        }

        if let Some(val) = lookup("VACSCAN_REFRESH") {
            if let Ok(refresh) = val.parse() {
                self.collector.refresh = refresh;
                tracing::debug!("Override collector.refresh from env: {}", refresh);
            }
        }

        if let Some(val) = lookup("VACSCAN_CACHE_DIR") {
            if !val.is_empty() {
                tracing::debug!("Override collector.cache_dir from env: {}", val);
                self.collector.cache_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/vacscan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vacscan", "vacscan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the default cache directory path.
    ///
    /// Uses XDG base directories: `~/.cache/vacscan`
    pub fn default_cache_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vacscan", "vacscan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.cache_dir().to_path_buf())
    }

    /// Cache directory to use: the configured one, else the XDG default.
    pub fn cache_dir(&self) -> ConfigResult<PathBuf> {
        match &self.collector.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_cache_dir(),
        }
    }
}

/// Collection engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Number of concurrent detail fetches; values below 1 mean 1
    pub workers: i64,
    /// Skip the cache read (results are still written back)
    pub refresh: bool,
    /// Delay after each completed detail fetch, in milliseconds
    pub pacing_ms: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Vacancies endpoint, with trailing slash
    pub base_url: String,
    /// User agent string
    pub user_agent: String,
    /// Handling of captcha/blocked detail responses
    pub blocked_policy: BlockedPolicy,
    /// Cache directory (defaults to the XDG cache dir)
    pub cache_dir: Option<PathBuf>,
    /// Retry behavior for transport failures
    pub retry: RetryConfig,
}

impl CollectorConfig {
    /// Worker count clamped to at least one.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        usize::try_from(self.workers.max(1)).unwrap_or(1)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            refresh: false,
            pacing_ms: 250,
            request_timeout_secs: 30,
            base_url: "https://api.hh.ru/vacancies/".to_string(),
            user_agent: "vacscan/0.1.0 (+https://github.com/vacscan/vacscan)".to_string(),
            blocked_policy: BlockedPolicy::Degrade,
            cache_dir: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry behavior for transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Base delay in milliseconds; attempt `n` waits `n * base_delay_ms`
    pub base_delay_ms: u64,
    /// Extra multiplier applied to the delay after an HTTP 429
    pub rate_limit_multiplier: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            rate_limit_multiplier: 3,
        }
    }
}

/// Search query settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Free-text search
    pub text: Option<String>,
    /// Professional role ids (see `https://api.hh.ru/professional_roles`)
    pub professional_roles: Vec<u32>,
    /// Additional scalar filters such as `area` or `per_page`
    pub params: BTreeMap<String, toml::Value>,
}

impl QueryConfig {
    /// Build the query: text first, then extra filters by name, then roles.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(text) = &self.text {
            query = query.with_text(text.clone());
        }
        for (name, value) in &self.params {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            query = query.with_param(name.clone(), value);
        }
        query.with_professional_roles(&self.professional_roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.collector.workers, 1);
        assert!(!config.collector.refresh);
        assert_eq!(config.collector.pacing_ms, 250);
        assert_eq!(config.collector.blocked_policy, BlockedPolicy::Degrade);
        assert_eq!(config.collector.retry.max_attempts, 3);
        assert_eq!(config.rates.get(BASE_CURRENCY), Some(1.0));
        assert_eq!(config.rates.len(), 1);
    }

    #[test]
    fn test_effective_workers_clamps() {
        let mut config = CollectorConfig::default();
        config.workers = 0;
        assert_eq!(config.effective_workers(), 1);
        config.workers = -4;
        assert_eq!(config.effective_workers(), 1);
        config.workers = 8;
        assert_eq!(config.effective_workers(), 8);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.collector.workers = 4;
        config.query.text = Some("rust developer".to_string());
        config.query.professional_roles = vec![96, 104];
        config
            .rates
            .insert("USD", 0.0126)
            .expect("insert USD rate");

        config.save_to(&config_path).expect("save config");
        let loaded = AppConfig::load_from(&config_path).expect("load config");

        assert_eq!(loaded.collector.workers, 4);
        assert_eq!(loaded.query.text.as_deref(), Some("rust developer"));
        assert_eq!(loaded.query.professional_roles, vec![96, 104]);
        assert_eq!(loaded.rates.get("USD"), Some(0.0126));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded =
            AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load defaults");
        assert_eq!(loaded.collector.workers, 1);
        assert!(loaded.rates.contains(BASE_CURRENCY));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[collector]
workers = 5
blocked_policy = "skip"

[query]
text = "python"
professional_roles = [96]

[query.params]
area = 1
per_page = 50

[rates]
RUR = 1.0
USD = 0.01264
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.collector.workers, 5);
        assert_eq!(config.collector.blocked_policy, BlockedPolicy::Skip);
        // These should be defaults
        assert_eq!(config.collector.pacing_ms, 250);
        assert_eq!(config.collector.retry.base_delay_ms, 2000);
        assert_eq!(config.rates.get("USD"), Some(0.01264));

        let query = config.query.to_query();
        assert_eq!(
            query.params(),
            &[
                ("text".to_string(), "python".to_string()),
                ("area".to_string(), "1".to_string()),
                ("per_page".to_string(), "50".to_string()),
            ]
        );
        assert_eq!(query.professional_roles(), &["96"]);
    }

    #[test]
    fn test_invalid_rates_rejected_on_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[rates]\nUSD = 0.0\n").expect("write config file");

        let err = AppConfig::load_from(&config_path).expect_err("zero rate must be rejected");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VACSCAN_WORKERS", "6"),
            ("VACSCAN_REFRESH", "true"),
            ("VACSCAN_CACHE_DIR", "/tmp/vacscan-cache"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.collector.workers, 6);
        assert!(config.collector.refresh);
        assert_eq!(
            config.cache_dir().expect("cache dir"),
            PathBuf::from("/tmp/vacscan-cache")
        );
    }

    #[test]
    fn test_unparseable_overrides_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "VACSCAN_WORKERS" => Some("many".to_string()),
            "VACSCAN_REFRESH" => Some("sometimes".to_string()),
            _ => None,
        });
        assert_eq!(config.collector.workers, 1);
        assert!(!config.collector.refresh);
    }
}
