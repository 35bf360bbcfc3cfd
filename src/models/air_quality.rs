//! Air quality index model

use serde::{Deserialize, Serialize};

/// AQI category on the 1-5 index scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiLevel {
    /// Level for an AQI index, clamping out-of-range values into 1-5
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index {
            0 | 1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            _ => AqiLevel::VeryPoor,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Air quality is good",
            AqiLevel::Fair => "Air quality is acceptable",
            AqiLevel::Moderate => "Sensitive groups should limit prolonged outdoor exertion",
            AqiLevel::Poor => "Everyone should avoid prolonged outdoor exertion",
            AqiLevel::VeryPoor => "Health alert: everyone may experience serious effects",
        }
    }
}

/// Pollutant concentrations in µg/m³
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutantConcentrations {
    pub pm2_5: f32,
    pub pm10: f32,
    pub no2: f32,
    pub o3: f32,
    pub so2: f32,
    pub co: f32,
}

/// Air quality snapshot for a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityReport {
    /// AQI index on the 1-5 scale
    pub index: u8,
    pub level: AqiLevel,
    pub components: PollutantConcentrations,
}

impl AirQualityReport {
    /// Build a report from a raw index, clamping into the 1-5 range
    #[must_use]
    pub fn from_index(index: u8, components: PollutantConcentrations) -> Self {
        let index = index.clamp(1, 5);
        Self {
            index,
            level: AqiLevel::from_index(index),
            components,
        }
    }

    /// Poor and Very Poor levels warrant an alert banner
    #[must_use]
    pub fn warrants_alert(&self) -> bool {
        self.index >= 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> PollutantConcentrations {
        PollutantConcentrations {
            pm2_5: 25.5,
            pm10: 38.2,
            no2: 45.3,
            o3: 65.8,
            so2: 15.2,
            co: 450.0,
        }
    }

    #[test]
    fn test_index_clamped_into_scale() {
        assert_eq!(AirQualityReport::from_index(0, components()).index, 1);
        assert_eq!(AirQualityReport::from_index(9, components()).index, 5);
    }

    #[test]
    fn test_levels() {
        assert_eq!(AqiLevel::from_index(1), AqiLevel::Good);
        assert_eq!(AqiLevel::from_index(5), AqiLevel::VeryPoor);
        assert_eq!(AqiLevel::from_index(5).label(), "Very Poor");
    }

    #[test]
    fn test_alert_threshold() {
        assert!(!AirQualityReport::from_index(3, components()).warrants_alert());
        assert!(AirQualityReport::from_index(4, components()).warrants_alert());
    }
}
