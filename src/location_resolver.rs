//! Coordinate resolution
//!
//! Picks the single authoritative location from competing readings by
//! fixed priority: device sensor, then manual entry, then the configured
//! fallback. An invalid reading is treated as absent rather than aborting
//! resolution. Interested subsystems observe location changes through
//! `LocationWatch` instead of a global event bus.

use tokio::sync::watch;
use tracing::debug;

use crate::Result;
use crate::error::RiskwatchError;
use crate::models::{
    COORDINATE_TOLERANCE, Coordinate, LocationReading, LocationSource, ResolvedLocation,
};

/// Stateless resolver over location readings
pub struct CoordinateResolver;

impl CoordinateResolver {
    /// Resolve the authoritative location
    ///
    /// Pure function over its inputs plus the configured fallback reading.
    ///
    /// # Errors
    /// `NoLocationAvailable` when no reading is usable and fallback is
    /// disallowed.
    pub fn resolve(
        device: Option<&LocationReading>,
        manual: Option<&LocationReading>,
        allow_fallback: bool,
        fallback: &LocationReading,
    ) -> Result<ResolvedLocation> {
        if let Some(resolved) = Self::validate(device, LocationSource::DeviceSensor) {
            debug!(location = %resolved.summary(), "Using device sensor reading");
            return Ok(resolved);
        }

        if let Some(resolved) = Self::validate(manual, LocationSource::ManualEntry) {
            debug!(location = %resolved.summary(), "Using manual entry");
            return Ok(resolved);
        }

        if allow_fallback {
            if let Some(resolved) =
                Self::validate(Some(fallback), LocationSource::FallbackDefault)
            {
                debug!(location = %resolved.summary(), "Using fallback default");
                return Ok(resolved);
            }
        }

        Err(RiskwatchError::NoLocationAvailable)
    }

    /// Validate a reading into a resolved location; invalid readings are
    /// logged and treated as absent
    fn validate(
        reading: Option<&LocationReading>,
        source: LocationSource,
    ) -> Option<ResolvedLocation> {
        let reading = reading?;
        match Coordinate::new(reading.latitude, reading.longitude) {
            Ok(coordinate) => Some(ResolvedLocation::new(
                coordinate,
                source,
                reading.label.clone(),
            )),
            Err(err) => {
                debug!(%source, %err, "Discarding invalid reading");
                None
            }
        }
    }
}

/// Observable stream of resolved-location changes
///
/// The owner publishes after each resolution; subscribers only see an
/// update when the location moved beyond the jitter tolerance or its
/// source changed.
pub struct LocationWatch {
    sender: watch::Sender<Option<ResolvedLocation>>,
}

impl LocationWatch {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Publish a newly resolved location; returns true when subscribers
    /// were notified
    pub fn publish(&self, location: ResolvedLocation) -> bool {
        let changed = {
            let current = self.sender.borrow();
            match current.as_ref() {
                Some(previous) => {
                    previous.source != location.source
                        || !previous
                            .coordinate
                            .approx_eq(&location.coordinate, COORDINATE_TOLERANCE)
                }
                None => true,
            }
        };

        if changed {
            debug!(location = %location.summary(), "Location changed");
            let _ = self.sender.send(Some(location));
        }
        changed
    }

    /// Subscribe to location changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ResolvedLocation>> {
        self.sender.subscribe()
    }

    /// Most recently published location
    #[must_use]
    pub fn current(&self) -> Option<ResolvedLocation> {
        self.sender.borrow().clone()
    }
}

impl Default for LocationWatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationLabel;
    use rstest::rstest;

    fn reading(lat: f64, lon: f64, city: &str) -> LocationReading {
        LocationReading::new(lat, lon, LocationLabel::new(city, "State", "Country"))
    }

    fn fallback() -> LocationReading {
        reading(26.9124, 75.7873, "Jaipur")
    }

    #[test]
    fn test_device_beats_manual() {
        let device = reading(19.0760, 72.8777, "Mumbai");
        let manual = reading(28.6139, 77.2090, "Delhi");
        let resolved =
            CoordinateResolver::resolve(Some(&device), Some(&manual), true, &fallback()).unwrap();
        assert_eq!(resolved.source, LocationSource::DeviceSensor);
        assert_eq!(resolved.coordinate.latitude(), 19.0760);
        assert_eq!(resolved.label.city, "Mumbai");
    }

    #[test]
    fn test_manual_used_when_device_absent() {
        let manual = reading(28.6139, 77.2090, "Delhi");
        let resolved =
            CoordinateResolver::resolve(None, Some(&manual), true, &fallback()).unwrap();
        assert_eq!(resolved.source, LocationSource::ManualEntry);
    }

    #[test]
    fn test_invalid_device_treated_as_absent() {
        let device = reading(120.0, 72.8777, "Nowhere");
        let manual = reading(28.6139, 77.2090, "Delhi");
        let resolved =
            CoordinateResolver::resolve(Some(&device), Some(&manual), true, &fallback()).unwrap();
        assert_eq!(resolved.source, LocationSource::ManualEntry);
    }

    #[test]
    fn test_fallback_when_nothing_else_usable() {
        let resolved = CoordinateResolver::resolve(None, None, true, &fallback()).unwrap();
        assert_eq!(resolved.source, LocationSource::FallbackDefault);
        assert_eq!(resolved.coordinate.latitude(), 26.9124);
        assert_eq!(resolved.coordinate.longitude(), 75.7873);
        assert_eq!(resolved.label.city, "Jaipur");
    }

    #[test]
    fn test_no_location_available() {
        let err = CoordinateResolver::resolve(None, None, false, &fallback()).unwrap_err();
        assert!(matches!(err, RiskwatchError::NoLocationAvailable));
    }

    #[rstest]
    #[case(f64::NAN, 75.0)]
    #[case(91.0, 75.0)]
    #[case(26.9, -190.0)]
    fn test_invalid_inputs_all_fall_through(#[case] lat: f64, #[case] lon: f64) {
        let bad = reading(lat, lon, "Bad");
        let err =
            CoordinateResolver::resolve(Some(&bad), Some(&bad), false, &fallback()).unwrap_err();
        assert!(matches!(err, RiskwatchError::NoLocationAvailable));
    }

    #[test]
    fn test_watch_suppresses_jitter() {
        let watch = LocationWatch::new();
        let first = CoordinateResolver::resolve(
            Some(&reading(26.9124, 75.7873, "Jaipur")),
            None,
            true,
            &fallback(),
        )
        .unwrap();
        assert!(watch.publish(first));

        // A few meters of drift is not a change
        let jitter = CoordinateResolver::resolve(
            Some(&reading(26.9126, 75.7871, "Jaipur")),
            None,
            true,
            &fallback(),
        )
        .unwrap();
        assert!(!watch.publish(jitter));

        // A genuinely different coordinate is
        let moved = CoordinateResolver::resolve(
            Some(&reading(28.6139, 77.2090, "Delhi")),
            None,
            true,
            &fallback(),
        )
        .unwrap();
        assert!(watch.publish(moved));
        assert_eq!(watch.current().unwrap().label.city, "Delhi");
    }

    #[tokio::test]
    async fn test_watch_notifies_subscribers() {
        let watch = LocationWatch::new();
        let mut receiver = watch.subscribe();
        assert!(receiver.borrow().is_none());

        let resolved = CoordinateResolver::resolve(None, None, true, &fallback()).unwrap();
        watch.publish(resolved);

        receiver.changed().await.unwrap();
        assert_eq!(
            receiver.borrow().as_ref().unwrap().source,
            LocationSource::FallbackDefault
        );
    }
}
