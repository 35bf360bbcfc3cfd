//! Domain taxonomy and fetch results
//!
//! A `Domain` is one category of environmental data the dashboard tracks.
//! Every fetch, cache entry, and provider chain is keyed by a domain, and
//! every fetch produces a `DomainResult` carrying its payload plus
//! provenance metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::air_quality::AirQualityReport;
use crate::models::alerts::AlertBulletin;
use crate::models::risk::RiskAssessment;
use crate::models::seismic::SeismicSummary;
use crate::models::weather::WeatherReport;

/// Category of environmental data served by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Weather,
    Risk,
    Alerts,
    AirQuality,
    Seismic,
}

impl Domain {
    /// All domains, in the order a refresh cycle walks them
    pub const ALL: [Domain; 5] = [
        Domain::Weather,
        Domain::Risk,
        Domain::Alerts,
        Domain::AirQuality,
        Domain::Seismic,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Weather => "weather",
            Domain::Risk => "risk",
            Domain::Alerts => "alerts",
            Domain::AirQuality => "air-quality",
            Domain::Seismic => "seismic",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(Domain::Weather),
            "risk" => Ok(Domain::Risk),
            "alerts" => Ok(Domain::Alerts),
            "air-quality" | "air_quality" => Ok(Domain::AirQuality),
            "seismic" => Ok(Domain::Seismic),
            other => Err(format!("Unknown domain: {other}")),
        }
    }
}

/// Whether a result came from a real upstream provider or was locally
/// synthesized after chain exhaustion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Real,
    Simulated,
}

impl Provenance {
    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Provenance::Real)
    }
}

/// Typed payload, one variant per domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DomainPayload {
    Weather(WeatherReport),
    Risk(RiskAssessment),
    Alerts(AlertBulletin),
    AirQuality(AirQualityReport),
    Seismic(SeismicSummary),
}

impl DomainPayload {
    /// Domain this payload belongs to
    #[must_use]
    pub fn domain(&self) -> Domain {
        match self {
            DomainPayload::Weather(_) => Domain::Weather,
            DomainPayload::Risk(_) => Domain::Risk,
            DomainPayload::Alerts(_) => Domain::Alerts,
            DomainPayload::AirQuality(_) => Domain::AirQuality,
            DomainPayload::Seismic(_) => Domain::Seismic,
        }
    }
}

/// Outcome of one completed fetch for one domain
///
/// Produced once per fetch and never mutated; a retry produces a fresh
/// result. The presentation layer renders `provenance` distinctly but must
/// never treat a `Simulated` result as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: Domain,
    pub payload: DomainPayload,
    pub provenance: Provenance,
    /// Name of the provider that produced the payload, or the synthesizer tag
    pub provider_name: String,
    /// Retries spent on the successful provider (attempts - 1)
    pub retries_used: u32,
    pub fetched_at: DateTime<Utc>,
}
