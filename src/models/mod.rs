//! Data models for the Riskwatch service
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated coordinates, reading sources, resolved locations
//! - Domain: the data-category taxonomy and tagged fetch results
//! - Weather / Risk / Alerts / `AirQuality` / Seismic: per-domain payloads

pub mod air_quality;
pub mod alerts;
pub mod domain;
pub mod location;
pub mod risk;
pub mod seismic;
pub mod weather;

// Re-export all public types for convenient access
pub use air_quality::{AirQualityReport, AqiLevel, PollutantConcentrations};
pub use alerts::{Alert, AlertBulletin, AlertSeverity, AlertUrgency};
pub use domain::{Domain, DomainPayload, DomainResult, Provenance};
pub use location::{
    COORDINATE_TOLERANCE, Coordinate, LocationLabel, LocationReading, LocationSource,
    ResolvedLocation,
};
pub use risk::{RiskAssessment, RiskBand};
pub use seismic::{SeismicEvent, SeismicSummary};
pub use weather::WeatherReport;
