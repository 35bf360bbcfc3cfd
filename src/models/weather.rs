//! Weather report model and display methods

use serde::{Deserialize, Serialize};

/// Current weather conditions at a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Temperature in Celsius
    pub temperature: f32,
    /// Apparent temperature in Celsius
    pub feels_like: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Atmospheric pressure in hPa
    pub pressure: f32,
    /// Wind speed in m/s
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// Human-readable description of conditions
    pub conditions: String,
    /// Visibility in kilometers
    pub visibility_km: f32,
}

impl WeatherReport {
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = Self::wind_direction_to_cardinal(self.wind_direction);
        format!("{:.1} m/s {}", self.wind_speed, direction)
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{:.1} hPa", self.pressure)
    }
}
