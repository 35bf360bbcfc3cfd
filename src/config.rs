//! Configuration management for the Riskwatch service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. Provider chains
//! are configuration, not code: each domain carries an ordered list of
//! provider specs with its own retry policy.

use crate::error::RiskwatchError;
use crate::models::{Domain, LocationLabel, LocationReading};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the Riskwatch service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskwatchConfig {
    /// Location resolution settings
    #[serde(default)]
    pub location: LocationConfig,
    /// Per-domain provider chains and cache TTLs
    #[serde(default)]
    pub domains: DomainsConfig,
    /// Auto-refresh settings
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Dashboard backend API settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP boundary settings
    #[serde(default)]
    pub web: WebConfig,
}

/// Location resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fallback latitude used when no device or manual reading is usable
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,
    /// Fallback longitude
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
    #[serde(default = "default_fallback_city")]
    pub fallback_city: String,
    #[serde(default = "default_fallback_state")]
    pub fallback_state: String,
    #[serde(default = "default_fallback_country")]
    pub fallback_country: String,
    /// Whether resolution may fall back to the default coordinate
    #[serde(default = "default_allow_fallback")]
    pub allow_fallback: bool,
    /// Persisted locations older than this are treated as absent
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u64,
    /// Directory for the persistent location store; disabled when unset
    #[serde(default)]
    pub persist_path: Option<String>,
}

/// One provider slot in a domain's chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Registry name of the provider ("backend", "open-meteo", "usgs")
    pub name: String,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
    /// Retries after the first attempt
    #[serde(default = "default_provider_max_retries")]
    pub max_retries: u32,
    /// Base delay before a retry in milliseconds
    #[serde(default = "default_provider_base_delay")]
    pub base_delay_ms: u64,
    /// Double the delay on every further retry
    #[serde(default = "default_provider_exponential")]
    pub exponential: bool,
}

impl ProviderSpec {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Chain and cache settings for one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Ordered provider chain, tried first to last
    pub providers: Vec<ProviderSpec>,
    /// Cache TTL in minutes
    pub ttl_minutes: u64,
}

impl DomainConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }
}

/// Seismic search window applied by the seismic providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeismicSearchConfig {
    #[serde(default = "default_seismic_radius")]
    pub radius_km: f64,
    #[serde(default = "default_seismic_min_magnitude")]
    pub min_magnitude: f64,
    #[serde(default = "default_seismic_days_back")]
    pub days_back: u32,
}

/// Per-domain provider chains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsConfig {
    #[serde(default = "default_weather_domain")]
    pub weather: DomainConfig,
    #[serde(default = "default_risk_domain")]
    pub risk: DomainConfig,
    #[serde(default = "default_alerts_domain")]
    pub alerts: DomainConfig,
    #[serde(default = "default_air_quality_domain")]
    pub air_quality: DomainConfig,
    #[serde(default = "default_seismic_domain")]
    pub seismic: DomainConfig,
    #[serde(default)]
    pub seismic_search: SeismicSearchConfig,
}

impl DomainsConfig {
    /// Chain configuration for a domain
    #[must_use]
    pub fn for_domain(&self, domain: Domain) -> &DomainConfig {
        match domain {
            Domain::Weather => &self.weather,
            Domain::Risk => &self.risk,
            Domain::Alerts => &self.alerts,
            Domain::AirQuality => &self.air_quality,
            Domain::Seismic => &self.seismic,
        }
    }
}

/// Auto-refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
    /// Start the scheduler on boot
    #[serde(default = "default_refresh_enabled")]
    pub enabled: bool,
}

impl RefreshConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Decimal places coordinates are rounded to for cache keys
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u32,
}

/// Dashboard backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for the dashboard's own backend API
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP boundary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_fallback_latitude() -> f64 {
    26.9124
}

fn default_fallback_longitude() -> f64 {
    75.7873
}

fn default_fallback_city() -> String {
    "Jaipur".to_string()
}

fn default_fallback_state() -> String {
    "Rajasthan".to_string()
}

fn default_fallback_country() -> String {
    "India".to_string()
}

fn default_allow_fallback() -> bool {
    true
}

fn default_freshness_minutes() -> u64 {
    60
}

fn default_provider_timeout() -> u64 {
    8
}

fn default_provider_max_retries() -> u32 {
    3
}

fn default_provider_base_delay() -> u64 {
    1000
}

fn default_provider_exponential() -> bool {
    true
}

fn provider(name: &str, timeout_seconds: u64, max_retries: u32, base_delay_ms: u64, exponential: bool) -> ProviderSpec {
    ProviderSpec {
        name: name.to_string(),
        timeout_seconds,
        max_retries,
        base_delay_ms,
        exponential,
    }
}

fn default_weather_domain() -> DomainConfig {
    DomainConfig {
        providers: vec![
            provider("backend", 8, 3, 1000, true),
            provider("open-meteo", 10, 2, 500, true),
        ],
        ttl_minutes: 15,
    }
}

fn default_risk_domain() -> DomainConfig {
    DomainConfig {
        // ML predictions take longer than plain lookups
        providers: vec![provider("backend", 15, 2, 1000, true)],
        ttl_minutes: 15,
    }
}

fn default_alerts_domain() -> DomainConfig {
    DomainConfig {
        // Safety-critical: fail fast and fall through to synthesis rather
        // than waiting out long backoffs
        providers: vec![provider("backend", 5, 1, 500, false)],
        ttl_minutes: 5,
    }
}

fn default_air_quality_domain() -> DomainConfig {
    DomainConfig {
        providers: vec![
            provider("backend", 8, 2, 1000, true),
            provider("open-meteo", 10, 2, 500, true),
        ],
        ttl_minutes: 30,
    }
}

fn default_seismic_domain() -> DomainConfig {
    DomainConfig {
        providers: vec![provider("usgs", 10, 3, 1000, true)],
        ttl_minutes: 30,
    }
}

fn default_seismic_radius() -> f64 {
    500.0
}

fn default_seismic_min_magnitude() -> f64 {
    3.0
}

fn default_seismic_days_back() -> u32 {
    30
}

fn default_refresh_interval() -> u64 {
    180
}

fn default_refresh_enabled() -> bool {
    true
}

fn default_coordinate_precision() -> u32 {
    2
}

fn default_backend_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
            fallback_city: default_fallback_city(),
            fallback_state: default_fallback_state(),
            fallback_country: default_fallback_country(),
            allow_fallback: default_allow_fallback(),
            freshness_minutes: default_freshness_minutes(),
            persist_path: None,
        }
    }
}

impl LocationConfig {
    /// The configured fallback as a resolver input
    #[must_use]
    pub fn fallback_reading(&self) -> LocationReading {
        LocationReading::new(
            self.fallback_latitude,
            self.fallback_longitude,
            LocationLabel::new(
                self.fallback_city.clone(),
                self.fallback_state.clone(),
                self.fallback_country.clone(),
            ),
        )
    }

    #[must_use]
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_minutes * 60)
    }
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            weather: default_weather_domain(),
            risk: default_risk_domain(),
            alerts: default_alerts_domain(),
            air_quality: default_air_quality_domain(),
            seismic: default_seismic_domain(),
            seismic_search: SeismicSearchConfig::default(),
        }
    }
}

impl Default for SeismicSearchConfig {
    fn default() -> Self {
        Self {
            radius_km: default_seismic_radius(),
            min_magnitude: default_seismic_min_magnitude(),
            days_back: default_seismic_days_back(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            enabled: default_refresh_enabled(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: default_coordinate_precision(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
        }
    }
}

impl Default for RiskwatchConfig {
    fn default() -> Self {
        Self {
            location: LocationConfig::default(),
            domains: DomainsConfig::default(),
            refresh: RefreshConfig::default(),
            cache: CacheConfig::default(),
            backend: BackendConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl RiskwatchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with RISKWATCH_ prefix
        builder = builder.add_source(
            Environment::with_prefix("RISKWATCH")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: RiskwatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("riskwatch").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_chains()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.location.fallback_latitude)
            || !(-180.0..=180.0).contains(&self.location.fallback_longitude)
        {
            return Err(RiskwatchError::config(format!(
                "Fallback coordinate ({}, {}) is out of range",
                self.location.fallback_latitude, self.location.fallback_longitude
            ))
            .into());
        }
        Ok(())
    }

    fn validate_chains(&self) -> Result<()> {
        for domain in Domain::ALL {
            let chain = self.domains.for_domain(domain);
            if chain.providers.is_empty() {
                return Err(RiskwatchError::config(format!(
                    "Domain '{domain}' has an empty provider chain"
                ))
                .into());
            }
            for spec in &chain.providers {
                if spec.name.is_empty() {
                    return Err(RiskwatchError::config(format!(
                        "Domain '{domain}' has a provider with an empty name"
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for domain in Domain::ALL {
            let chain = self.domains.for_domain(domain);
            if chain.ttl_minutes == 0 || chain.ttl_minutes > 1440 {
                return Err(RiskwatchError::config(format!(
                    "Domain '{domain}' TTL must be between 1 and 1440 minutes"
                ))
                .into());
            }
            for spec in &chain.providers {
                if spec.timeout_seconds == 0 || spec.timeout_seconds > 300 {
                    return Err(RiskwatchError::config(format!(
                        "Provider '{}' timeout must be between 1 and 300 seconds",
                        spec.name
                    ))
                    .into());
                }
                if spec.max_retries > 10 {
                    return Err(RiskwatchError::config(format!(
                        "Provider '{}' max retries cannot exceed 10",
                        spec.name
                    ))
                    .into());
                }
            }
        }

        if self.refresh.interval_seconds < 30 {
            return Err(
                RiskwatchError::config("Refresh interval cannot be below 30 seconds").into(),
            );
        }

        if self.cache.coordinate_precision > 6 {
            return Err(
                RiskwatchError::config("Coordinate precision cannot exceed 6 decimals").into(),
            );
        }

        if self.location.freshness_minutes == 0 {
            return Err(
                RiskwatchError::config("Location freshness window cannot be zero").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RiskwatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RiskwatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(RiskwatchError::config(
                "Backend base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}
