//! Seismic event models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::Coordinate;

/// A single recorded earthquake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeismicEvent {
    pub magnitude: f32,
    /// Human-readable epicenter description
    pub place: String,
    pub time: DateTime<Utc>,
    pub depth_km: f32,
    pub coordinate: Coordinate,
}

/// Recent earthquakes within a search radius of a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeismicSummary {
    pub events: Vec<SeismicEvent>,
    pub count: usize,
    pub radius_km: f64,
}

impl SeismicSummary {
    #[must_use]
    pub fn new(events: Vec<SeismicEvent>, radius_km: f64) -> Self {
        let count = events.len();
        Self {
            events,
            count,
            radius_km,
        }
    }

    /// A summary with no events; the synthesizer never invents earthquakes
    #[must_use]
    pub fn empty(radius_km: f64) -> Self {
        Self::new(Vec::new(), radius_km)
    }

    /// Strongest event by magnitude
    #[must_use]
    pub fn strongest(&self) -> Option<&SeismicEvent> {
        self.events
            .iter()
            .max_by(|a, b| {
                a.magnitude
                    .partial_cmp(&b.magnitude)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}
