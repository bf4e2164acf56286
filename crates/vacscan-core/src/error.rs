//! Core error types for vacscan.
//!
//! Configuration problems get their own enum; everything else that the
//! shared types can reject is folded into [`VacscanError`].

use thiserror::Error;

/// Central error type for shared vacscan operations.
#[derive(Error, Debug)]
pub enum VacscanError {
    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `VacscanError`.
pub type Result<T> = std::result::Result<T, VacscanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VacscanError::Validation("currency code must be 3 letters".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: currency code must be 3 letters"
        );

        let err = ConfigError::InvalidValue {
            field: "rates.USD".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for rates.USD: must be positive"
        );
    }

    #[test]
    fn test_validation_error_becomes_invalid_value() {
        let err = VacscanError::Validation("rate must be positive".to_string());
        let config_err = ConfigError::InvalidValue {
            field: "rates".to_string(),
            reason: err.to_string(),
        };
        assert!(config_err.to_string().ends_with("validation error: rate must be positive"));
    }
}
