//! Riskwatch - resilient multi-source environmental risk data resolution
//!
//! This library provides the data layer behind an environmental-risk
//! dashboard: authoritative location resolution, prioritized provider
//! chains with bounded retries, deterministic fallback synthesis, TTL
//! caching, and refresh scheduling.

pub mod api;
pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod location_store;
pub mod models;
pub mod providers;
pub mod scheduler;
pub mod service;
pub mod synth;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheKey, TtlCache};
pub use chain::{Provider, ProviderChain, ProviderSlot};
pub use config::{ProviderSpec, RiskwatchConfig};
pub use error::RiskwatchError;
pub use location_resolver::{CoordinateResolver, LocationWatch};
pub use location_store::LocationStore;
pub use models::{
    Coordinate, Domain, DomainPayload, DomainResult, LocationLabel, LocationReading,
    LocationSource, Provenance, ResolvedLocation,
};
pub use scheduler::{RefreshScheduler, RefreshSnapshot, SchedulerState};
pub use service::DomainDataService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RiskwatchError>;
