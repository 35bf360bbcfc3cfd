//! Open-Meteo providers
//!
//! Open-Meteo serves current weather and air quality without an API key,
//! which makes it the natural second slot behind the dashboard backend.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::chain::Provider;
use crate::error::RiskwatchError;
use crate::models::{
    AirQualityReport, Coordinate, DomainPayload, PollutantConcentrations, WeatherReport,
};

pub const PROVIDER_NAME: &str = "open-meteo";

const FORECAST_BASE_URL: &str = "https://api.open-meteo.com/v1";
const AIR_QUALITY_BASE_URL: &str = "https://air-quality-api.open-meteo.com/v1";

fn provider_error(message: impl std::fmt::Display) -> RiskwatchError {
    RiskwatchError::provider(PROVIDER_NAME, message.to_string())
}

/// WMO weather interpretation codes to display text
fn weather_code_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Current-weather provider backed by the Open-Meteo forecast API
pub struct OpenMeteoWeatherProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeatherProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: FORECAST_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl Provider for OpenMeteoWeatherProvider {
    async fn invoke(&self, coordinate: Coordinate) -> Result<DomainPayload> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,apparent_temperature,relative_humidity_2m,surface_pressure,wind_speed_10m,wind_direction_10m,weather_code&wind_speed_unit=ms",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        );
        debug!(%url, "Fetching current weather from Open-Meteo");

        let response: openmeteo::ForecastResponse = self
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

        let current = response
            .current
            .ok_or_else(|| provider_error("Response missing current weather block"))?;

        Ok(DomainPayload::Weather(WeatherReport {
            temperature: current.temperature,
            feels_like: current.apparent_temperature.unwrap_or(current.temperature),
            humidity: current.relative_humidity.clamp(0.0, 100.0) as u8,
            pressure: current.surface_pressure,
            wind_speed: current.wind_speed,
            wind_direction: current.wind_direction,
            conditions: weather_code_description(current.weather_code).to_string(),
            // The current-conditions endpoint does not report visibility
            visibility_km: 10.0,
        }))
    }
}

/// European-AQI (0-100+) to the dashboard's 1-5 index scale
fn european_aqi_to_index(aqi: f32) -> u8 {
    match aqi {
        a if a <= 20.0 => 1,
        a if a <= 40.0 => 2,
        a if a <= 60.0 => 3,
        a if a <= 80.0 => 4,
        _ => 5,
    }
}

/// Air-quality provider backed by the Open-Meteo air-quality API
pub struct OpenMeteoAirQualityProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoAirQualityProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: AIR_QUALITY_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl Provider for OpenMeteoAirQualityProvider {
    async fn invoke(&self, coordinate: Coordinate) -> Result<DomainPayload> {
        let url = format!(
            "{}/air-quality?latitude={}&longitude={}&current=european_aqi,pm2_5,pm10,nitrogen_dioxide,ozone,sulphur_dioxide,carbon_monoxide",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude()
        );
        debug!(%url, "Fetching air quality from Open-Meteo");

        let response: openmeteo::AirQualityResponse = self
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

        let current = response
            .current
            .ok_or_else(|| provider_error("Response missing current air-quality block"))?;

        Ok(DomainPayload::AirQuality(AirQualityReport::from_index(
            european_aqi_to_index(current.european_aqi),
            PollutantConcentrations {
                pm2_5: current.pm2_5,
                pm10: current.pm10,
                no2: current.nitrogen_dioxide,
                o3: current.ozone,
                so2: current.sulphur_dioxide,
                co: current.carbon_monoxide,
            },
        )))
    }
}

/// `OpenMeteo` API response structures
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub latitude: f64,
        pub longitude: f64,
        pub current: Option<CurrentWeather>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        #[serde(rename = "temperature_2m")]
        pub temperature: f32,
        #[serde(rename = "apparent_temperature")]
        pub apparent_temperature: Option<f32>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: f32,
        pub surface_pressure: f32,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: f32,
        #[serde(rename = "wind_direction_10m")]
        pub wind_direction: u16,
        pub weather_code: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct AirQualityResponse {
        pub latitude: f64,
        pub longitude: f64,
        pub current: Option<CurrentAirQuality>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentAirQuality {
        pub european_aqi: f32,
        pub pm2_5: f32,
        pub pm10: f32,
        pub nitrogen_dioxide: f32,
        pub ozone: f32,
        pub sulphur_dioxide: f32,
        pub carbon_monoxide: f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_code_mapping() {
        assert_eq!(weather_code_description(0), "Clear sky");
        assert_eq!(weather_code_description(2), "Partly cloudy");
        assert_eq!(weather_code_description(63), "Rain");
        assert_eq!(weather_code_description(75), "Snow");
        assert_eq!(weather_code_description(96), "Thunderstorm");
        assert_eq!(weather_code_description(200), "Unknown");
    }

    #[test]
    fn test_european_aqi_banding() {
        assert_eq!(european_aqi_to_index(5.0), 1);
        assert_eq!(european_aqi_to_index(20.0), 1);
        assert_eq!(european_aqi_to_index(35.0), 2);
        assert_eq!(european_aqi_to_index(55.0), 3);
        assert_eq!(european_aqi_to_index(75.0), 4);
        assert_eq!(european_aqi_to_index(140.0), 5);
    }
}
