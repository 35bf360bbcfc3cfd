//! USGS earthquake provider
//!
//! Queries the USGS FDSN event service for recent earthquakes around a
//! coordinate. The API takes a bounding box, so the configured radius is
//! converted to a degree window and the returned events are re-filtered by
//! great-circle distance.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::chain::Provider;
use crate::config::SeismicSearchConfig;
use crate::error::RiskwatchError;
use crate::models::{Coordinate, DomainPayload, SeismicEvent, SeismicSummary};

pub const PROVIDER_NAME: &str = "usgs";

const BASE_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Rough conversion: one degree of latitude is ~111 km
const KM_PER_DEGREE: f64 = 111.0;

fn provider_error(message: impl std::fmt::Display) -> RiskwatchError {
    RiskwatchError::provider(PROVIDER_NAME, message.to_string())
}

pub struct UsgsProvider {
    client: Client,
    base_url: String,
    search: SeismicSearchConfig,
}

impl UsgsProvider {
    #[must_use]
    pub fn new(client: Client, search: SeismicSearchConfig) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            search,
        }
    }

    fn query_url(&self, coordinate: &Coordinate, start: DateTime<Utc>) -> String {
        let lat = coordinate.latitude();
        let lon = coordinate.longitude();
        let lat_range = self.search.radius_km / KM_PER_DEGREE;
        // Longitude degrees shrink toward the poles; keep the window sane
        let lon_shrink = lat.to_radians().cos().max(0.01);
        let lon_range = self.search.radius_km / (KM_PER_DEGREE * lon_shrink);

        format!(
            "{}?format=geojson&starttime={}&minmagnitude={}&minlatitude={}&maxlatitude={}&minlongitude={}&maxlongitude={}&orderby=time",
            self.base_url,
            start.format("%Y-%m-%d"),
            self.search.min_magnitude,
            (lat - lat_range).max(-90.0),
            (lat + lat_range).min(90.0),
            (lon - lon_range).max(-180.0),
            (lon + lon_range).min(180.0),
        )
    }
}

#[async_trait]
impl Provider for UsgsProvider {
    async fn invoke(&self, coordinate: Coordinate) -> Result<DomainPayload> {
        let start = Utc::now() - Duration::days(i64::from(self.search.days_back));
        let url = self.query_url(&coordinate, start);
        debug!(%url, "Querying USGS event service");

        let response: usgs::QueryResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(provider_error)?
            .error_for_status()
            .map_err(provider_error)?
            .json()
            .await
            .map_err(provider_error)?;

        let events: Vec<SeismicEvent> = response
            .features
            .into_iter()
            .filter_map(|feature| {
                let magnitude = feature.properties.mag? as f32;
                let [lon, lat, depth] = feature.geometry.coordinates;
                let epicenter = Coordinate::new(lat, lon).ok()?;
                let time = DateTime::from_timestamp_millis(feature.properties.time)?;
                Some(SeismicEvent {
                    magnitude,
                    place: feature.properties.place.unwrap_or_default(),
                    time,
                    depth_km: depth as f32,
                    coordinate: epicenter,
                })
            })
            // The bounding box over-selects at its corners
            .filter(|event| {
                coordinate.distance_km(&event.coordinate) <= self.search.radius_km
            })
            .collect();

        debug!(count = events.len(), "USGS events within radius");
        Ok(DomainPayload::Seismic(SeismicSummary::new(
            events,
            self.search.radius_km,
        )))
    }
}

/// USGS FDSN geojson response structures
mod usgs {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct QueryResponse {
        #[serde(default)]
        pub features: Vec<Feature>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Feature {
        pub properties: Properties,
        pub geometry: Geometry,
    }

    #[derive(Debug, Deserialize)]
    pub struct Properties {
        pub mag: Option<f64>,
        pub place: Option<String>,
        /// Milliseconds since the Unix epoch
        pub time: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        /// [longitude, latitude, depth_km]
        pub coordinates: [f64; 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_bounding_box() {
        let provider = UsgsProvider::new(Client::new(), SeismicSearchConfig::default());
        let coordinate = Coordinate::new(19.2597, -103.6894).unwrap();
        let start = DateTime::parse_from_rfc3339("2026-07-07T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let url = provider.query_url(&coordinate, start);
        assert!(url.contains("format=geojson"));
        assert!(url.contains("starttime=2026-07-07"));
        assert!(url.contains("minmagnitude=3"));
        assert!(url.contains("orderby=time"));
        // 500 km is ~4.5 degrees of latitude either side
        assert!(url.contains("minlatitude=14.7"));
        assert!(url.contains("maxlatitude=23.7"));
    }

    #[test]
    fn test_bounding_box_clamped_at_poles() {
        let provider = UsgsProvider::new(Client::new(), SeismicSearchConfig::default());
        let coordinate = Coordinate::new(89.0, 0.0).unwrap();
        let start = Utc::now();

        let url = provider.query_url(&coordinate, start);
        assert!(url.contains("maxlatitude=90"));
        assert!(!url.contains("maxlatitude=93"));
    }
}
