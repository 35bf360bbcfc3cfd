//! Dashboard backend API provider
//!
//! The dashboard's own backend exposes weather, risk prediction, alert,
//! and air-quality endpoints. One provider type covers all of them, keyed
//! by the domain it was registered for.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::chain::Provider;
use crate::error::RiskwatchError;
use crate::models::{
    AirQualityReport, Alert, AlertBulletin, AlertSeverity, AlertUrgency, Coordinate, Domain,
    DomainPayload, PollutantConcentrations, RiskAssessment, WeatherReport,
};

pub const PROVIDER_NAME: &str = "backend";

pub struct BackendProvider {
    client: Client,
    base_url: String,
    domain: Domain,
}

impl BackendProvider {
    #[must_use]
    pub fn new(client: Client, base_url: String, domain: Domain) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            domain,
        }
    }

    fn error(message: impl std::fmt::Display) -> RiskwatchError {
        RiskwatchError::provider(PROVIDER_NAME, message.to_string())
    }

    async fn weather(&self, coordinate: Coordinate) -> Result<WeatherReport> {
        let url = format!(
            "{}/api/weather/{}/{}",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        );
        debug!(%url, "Fetching weather from backend");

        let response: wire::WeatherResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::error)?
            .error_for_status()
            .map_err(Self::error)?
            .json()
            .await
            .map_err(Self::error)?;

        Ok(WeatherReport {
            temperature: response.temperature,
            feels_like: response
                .temperature_feels_like
                .unwrap_or(response.temperature),
            humidity: response.humidity.clamp(0.0, 100.0) as u8,
            pressure: response.pressure,
            wind_speed: response.wind_speed,
            wind_direction: response.wind_direction.unwrap_or(0),
            conditions: response.conditions,
            visibility_km: response.visibility.unwrap_or(10.0),
        })
    }

    async fn risk(&self, coordinate: Coordinate) -> Result<RiskAssessment> {
        let url = format!("{}/api/predict/disaster", self.base_url);
        let request = wire::PredictionRequest {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            include_external_data: true,
        };
        debug!(%url, "Requesting risk prediction from backend");

        let response: wire::PredictionResponse = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(Self::error)?
            .error_for_status()
            .map_err(Self::error)?
            .json()
            .await
            .map_err(Self::error)?;

        Ok(RiskAssessment::clamped(
            response.risk_score,
            response.flood_risk,
            response.fire_risk,
            response.earthquake_risk,
            response.storm_risk,
            response.confidence,
        ))
    }

    async fn alerts(&self, coordinate: Coordinate) -> Result<AlertBulletin> {
        let url = format!(
            "{}/api/alerts?lat={}&lon={}",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        );
        debug!(%url, "Fetching active alerts from backend");

        let response: wire::AlertsResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::error)?
            .error_for_status()
            .map_err(Self::error)?
            .json()
            .await
            .map_err(Self::error)?;

        let alerts = response
            .alerts
            .into_iter()
            .map(|alert| Alert {
                id: alert.id,
                title: alert.title,
                description: alert.description,
                // Lenient parsing: an unknown band downgrades rather than
                // dropping the whole bulletin
                severity: alert
                    .severity
                    .parse()
                    .unwrap_or(AlertSeverity::Moderate),
                urgency: match alert.urgency.as_str() {
                    "Immediate" => AlertUrgency::Immediate,
                    "Future" => AlertUrgency::Future,
                    "Past" => AlertUrgency::Past,
                    _ => AlertUrgency::Expected,
                },
                event: alert.event,
                onset: alert.onset,
                expires: alert.expires,
            })
            .collect();

        Ok(AlertBulletin::new(alerts))
    }

    async fn air_quality(&self, coordinate: Coordinate) -> Result<AirQualityReport> {
        let url = format!(
            "{}/api/weather/air-quality/{}/{}",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        );
        debug!(%url, "Fetching air quality from backend");

        let response: wire::AirQualityResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::error)?
            .error_for_status()
            .map_err(Self::error)?
            .json()
            .await
            .map_err(Self::error)?;

        Ok(AirQualityReport::from_index(
            response.aqi,
            PollutantConcentrations {
                pm2_5: response.components.pm2_5,
                pm10: response.components.pm10,
                no2: response.components.no2,
                o3: response.components.o3,
                so2: response.components.so2,
                co: response.components.co,
            },
        ))
    }
}

#[async_trait]
impl Provider for BackendProvider {
    async fn invoke(&self, coordinate: Coordinate) -> Result<DomainPayload> {
        match self.domain {
            Domain::Weather => self.weather(coordinate).await.map(DomainPayload::Weather),
            Domain::Risk => self.risk(coordinate).await.map(DomainPayload::Risk),
            Domain::Alerts => self.alerts(coordinate).await.map(DomainPayload::Alerts),
            Domain::AirQuality => self
                .air_quality(coordinate)
                .await
                .map(DomainPayload::AirQuality),
            Domain::Seismic => Err(Self::error("backend does not serve seismic data")),
        }
    }
}

/// Backend API response structures
mod wire {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize)]
    pub struct WeatherResponse {
        pub temperature: f32,
        pub temperature_feels_like: Option<f32>,
        pub humidity: f32,
        pub wind_speed: f32,
        pub wind_direction: Option<u16>,
        pub pressure: f32,
        pub conditions: String,
        pub visibility: Option<f32>,
    }

    #[derive(Debug, Serialize)]
    pub struct PredictionRequest {
        pub latitude: f64,
        pub longitude: f64,
        pub include_external_data: bool,
    }

    #[derive(Debug, Deserialize)]
    pub struct PredictionResponse {
        pub risk_score: f32,
        pub flood_risk: f32,
        pub fire_risk: f32,
        pub earthquake_risk: f32,
        pub storm_risk: f32,
        pub confidence: f32,
    }

    #[derive(Debug, Deserialize)]
    pub struct AlertsResponse {
        #[serde(default)]
        pub alerts: Vec<AlertEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AlertEntry {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub description: String,
        pub severity: String,
        #[serde(default)]
        pub urgency: String,
        #[serde(default)]
        pub event: String,
        pub onset: DateTime<Utc>,
        pub expires: DateTime<Utc>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AirQualityResponse {
        pub aqi: u8,
        pub components: Components,
    }

    #[derive(Debug, Deserialize)]
    pub struct Components {
        pub pm2_5: f32,
        pub pm10: f32,
        pub no2: f32,
        pub o3: f32,
        pub so2: f32,
        pub co: f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let provider = BackendProvider::new(
            Client::new(),
            "http://127.0.0.1:8000/".to_string(),
            Domain::Weather,
        );
        assert_eq!(provider.base_url, "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_seismic_unsupported() {
        let provider = BackendProvider::new(
            Client::new(),
            "http://127.0.0.1:8000".to_string(),
            Domain::Seismic,
        );
        let err = provider
            .invoke(Coordinate::new(26.9124, 75.7873).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RiskwatchError::ProviderError { .. }));
    }
}
