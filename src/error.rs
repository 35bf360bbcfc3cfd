//! Error types and handling for the Riskwatch service

use thiserror::Error;

use crate::models::Domain;

/// Main error type for the Riskwatch service
///
/// Per-domain fetch failures are absorbed before they reach the
/// presentation boundary; `NoLocationAvailable` is the one error that
/// propagates, since there is nothing to synthesize against.
#[derive(Error, Debug)]
pub enum RiskwatchError {
    /// A coordinate failed bounds validation
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// A single provider attempt exceeded its timeout
    #[error("Provider '{provider}' timed out")]
    ProviderTimeout { provider: String },

    /// A provider responded with a failure indicator
    #[error("Provider '{provider}' error: {message}")]
    ProviderError { provider: String, message: String },

    /// Every provider and retry in a domain's chain failed
    #[error("All providers exhausted for domain '{domain}'")]
    ChainExhausted { domain: Domain },

    /// No device, manual, or fallback coordinate could be resolved
    #[error("No location available")]
    NoLocationAvailable,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cache or persistent store operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl RiskwatchError {
    /// Create a new invalid-coordinate error
    pub fn invalid_coordinate<S: Into<String>>(message: S) -> Self {
        Self::InvalidCoordinate {
            message: message.into(),
        }
    }

    /// Create a new provider-timeout error
    pub fn provider_timeout<S: Into<String>>(provider: S) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>, M: Into<String>>(provider: S, message: M) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// True for failures the chain executor counts against a provider's
    /// attempt budget and retries
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RiskwatchError::ProviderTimeout { .. } | RiskwatchError::ProviderError { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RiskwatchError::InvalidCoordinate { message } => {
                format!("Invalid coordinates: {message}")
            }
            RiskwatchError::ProviderTimeout { .. } | RiskwatchError::ProviderError { .. } => {
                "An upstream data service did not respond. Retrying automatically.".to_string()
            }
            RiskwatchError::ChainExhausted { domain } => {
                format!("Live {domain} data is unavailable; showing estimated values.")
            }
            RiskwatchError::NoLocationAvailable => {
                "Unable to determine your location. Please enter it manually.".to_string()
            }
            RiskwatchError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            RiskwatchError::Cache { .. } => {
                "Cache operation failed. You may need to clear the cache.".to_string()
            }
            RiskwatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = RiskwatchError::config("missing base URL");
        assert!(matches!(config_err, RiskwatchError::Config { .. }));

        let provider_err = RiskwatchError::provider("backend", "HTTP 503");
        assert!(matches!(provider_err, RiskwatchError::ProviderError { .. }));

        let coord_err = RiskwatchError::invalid_coordinate("latitude 95 out of range");
        assert!(matches!(coord_err, RiskwatchError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RiskwatchError::provider_timeout("backend").is_retryable());
        assert!(RiskwatchError::provider("usgs", "HTTP 500").is_retryable());
        assert!(!RiskwatchError::NoLocationAvailable.is_retryable());
        assert!(
            !RiskwatchError::ChainExhausted {
                domain: Domain::Weather
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_user_messages() {
        let err = RiskwatchError::NoLocationAvailable;
        assert!(err.user_message().contains("manually"));

        let err = RiskwatchError::ChainExhausted {
            domain: Domain::AirQuality,
        };
        assert!(err.user_message().contains("air-quality"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RiskwatchError = io_err.into();
        assert!(matches!(err, RiskwatchError::Io { .. }));
    }
}
