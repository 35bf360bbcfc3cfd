//! Location models: validated coordinates, reading sources, and resolved
//! locations

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::error::RiskwatchError;

/// Tolerance under which two coordinates count as the same reading (~100 m)
pub const COORDINATE_TOLERANCE: f64 = 0.001;

/// A validated geographic coordinate
///
/// Construction enforces the bounds invariant; fields stay private so a
/// `Coordinate` in hand is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    ///
    /// # Errors
    /// Returns `InvalidCoordinate` for NaN or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, RiskwatchError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(RiskwatchError::invalid_coordinate(format!(
                "Coordinate components must be finite, got ({latitude}, {longitude})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(RiskwatchError::invalid_coordinate(format!(
                "Latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(RiskwatchError::invalid_coordinate(format!(
                "Longitude {longitude} outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// True when the other coordinate lies within `tolerance` degrees on
    /// both axes; callers use this to skip redundant refreshes on GPS jitter
    #[must_use]
    pub fn approx_eq(&self, other: &Coordinate, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance
            && (self.longitude - other.longitude).abs() <= tolerance
    }

    /// Round both axes to `precision` decimal places, for cache keys
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(2));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Great-circle distance to another coordinate in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format as a short display string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Where a location reading came from
///
/// The derived order is the resolution priority: `DeviceSensor` beats
/// `ManualEntry` beats `FallbackDefault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    FallbackDefault,
    ManualEntry,
    DeviceSensor,
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LocationSource::DeviceSensor => "device-sensor",
            LocationSource::ManualEntry => "manual-entry",
            LocationSource::FallbackDefault => "fallback-default",
        };
        f.write_str(name)
    }
}

/// Human-readable place description attached to a location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationLabel {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl LocationLabel {
    #[must_use]
    pub fn new(
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            country: country.into(),
        }
    }
}

impl std::fmt::Display for LocationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.city, self.state, self.country)
    }
}

/// An unvalidated location reading as delivered by a sensor or typed in by
/// the user; the resolver validates it before use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub label: LocationLabel,
}

impl LocationReading {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, label: LocationLabel) -> Self {
        Self {
            latitude,
            longitude,
            label,
        }
    }
}

/// The single authoritative location produced by resolution
///
/// Immutable: a changed input produces a new value rather than mutating an
/// existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub source: LocationSource,
    pub label: LocationLabel,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(coordinate: Coordinate, source: LocationSource, label: LocationLabel) -> Self {
        Self {
            coordinate,
            source,
            label,
        }
    }

    /// Short summary string, e.g. for log lines
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) [{}]",
            self.label,
            self.coordinate.format(),
            self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_valid_bounds() {
        assert!(Coordinate::new(26.9124, 75.7873).is_ok());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.01, 0.0).is_err());
        assert!(Coordinate::new(-90.01, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_coordinate_rejects_nan_and_infinity() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_approx_eq_within_tolerance() {
        let a = Coordinate::new(26.9124, 75.7873).unwrap();
        let b = Coordinate::new(26.9129, 75.7870).unwrap();
        assert!(a.approx_eq(&b, COORDINATE_TOLERANCE));

        let c = Coordinate::new(26.92, 75.7873).unwrap();
        assert!(!a.approx_eq(&c, COORDINATE_TOLERANCE));
    }

    #[test]
    fn test_rounding_for_cache_keys() {
        let c = Coordinate::new(46.818_234, 8.227_456).unwrap();
        assert_eq!(c.rounded(2), (46.82, 8.23));
        assert_eq!(c.rounded(0), (47.0, 8.0));
    }

    #[test]
    fn test_source_priority_order() {
        assert!(LocationSource::DeviceSensor > LocationSource::ManualEntry);
        assert!(LocationSource::ManualEntry > LocationSource::FallbackDefault);
    }

    #[test]
    fn test_distance_between_known_cities() {
        // Jaipur to Delhi is roughly 240 km
        let jaipur = Coordinate::new(26.9124, 75.7873).unwrap();
        let delhi = Coordinate::new(28.6139, 77.2090).unwrap();
        let d = jaipur.distance_km(&delhi);
        assert!((200.0..280.0).contains(&d), "unexpected distance {d}");
    }
}
