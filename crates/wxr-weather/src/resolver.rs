//! Turns "here" or a free-text query into a single place.

use std::fmt;
use std::sync::Arc;

use wxr_core::Logger;

use crate::geocode::{GeocodeError, Geocoder};
use crate::location::LocationSensor;
use crate::place::Place;

/// Either the resolved place or a human-readable error
pub type PlaceResolution = Result<Place, String>;

/// Which geocoding direction produced a result; prefixes error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeDirection {
    Lookup,
    Reverse,
}

impl fmt::Display for GeocodeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeDirection::Lookup => f.write_str("Lookup"),
            GeocodeDirection::Reverse => f.write_str("Reverse"),
        }
    }
}

pub struct PlaceResolver {
    sensor: Arc<dyn LocationSensor>,
    geocoder: Arc<dyn Geocoder>,
    logger: Arc<dyn Logger>,
}

impl PlaceResolver {
    pub fn new(
        sensor: Arc<dyn LocationSensor>,
        geocoder: Arc<dyn Geocoder>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            sensor,
            geocoder,
            logger,
        }
    }

    /// Resolve the device's current position to a place
    pub async fn resolve_current(&self) -> PlaceResolution {
        self.sensor.start_updating();
        let fixes = self.sensor.next_fix().await;
        self.sensor.stop_updating();

        let fixes = fixes.map_err(|e| e.to_string())?;
        let Some(first) = fixes.first().copied() else {
            return Err("Received no locations from location sensor.".to_string());
        };

        self.logger
            .debug(&format!("Received {} location(s) from location sensor.", fixes.len()));
        self.logger.debug("Reverse geocoding location...");
        let result = self.geocoder.reverse_geocode(first).await;
        self.complete(GeocodeDirection::Reverse, result)
    }

    /// Resolve a free-text place name or address
    pub async fn resolve_by_name(&self, text: &str) -> PlaceResolution {
        self.logger.debug(&format!("Geocoding address '{}'...", text));
        let result = self.geocoder.geocode_address(text).await;
        self.complete(GeocodeDirection::Lookup, result)
    }

    fn complete(
        &self,
        direction: GeocodeDirection,
        result: Result<Vec<Place>, GeocodeError>,
    ) -> PlaceResolution {
        match result {
            Ok(places) => {
                let count = places.len();
                match places.into_iter().next() {
                    Some(place) => {
                        self.logger
                            .debug(&format!("Received {} placemark(s) from geocoder.", count));
                        Ok(place)
                    }
                    None => Err(format!("{} error: bad placemark", direction)),
                }
            }
            Err(GeocodeError::Unknown) => Err(format!("{} error: unknown error", direction)),
            Err(e) => Err(format!("{} error: {}", direction, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FixedLocationSensor, LocationError, UnavailableSensor};
    use crate::types::Coordinate;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct NullLogger;

    impl Logger for NullLogger {
        fn info(&self, _message: &str) {}
        fn warn(&self, _message: &str) {}
        fn error(&self, _message: &str) {}
        fn debug(&self, _message: &str) {}
    }

    /// Geocoder that replays a canned outcome and records what it was asked
    struct ScriptedGeocoder {
        outcome: Mutex<Option<Result<Vec<Place>, GeocodeError>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedGeocoder {
        fn new(outcome: Result<Vec<Place>, GeocodeError>) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(Some(outcome)),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn take(&self) -> Result<Vec<Place>, GeocodeError> {
            self.outcome.lock().take().unwrap_or(Err(GeocodeError::Unknown))
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn geocode_address(&self, text: &str) -> Result<Vec<Place>, GeocodeError> {
            self.queries.lock().push(format!("lookup:{}", text));
            self.take()
        }

        async fn reverse_geocode(
            &self,
            coordinate: Coordinate,
        ) -> Result<Vec<Place>, GeocodeError> {
            self.queries.lock().push(format!("reverse:{}", coordinate));
            self.take()
        }
    }

    struct EmptySensor {
        started: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl LocationSensor for EmptySensor {
        fn start_updating(&self) {
            self.started.lock().push("start");
        }

        fn stop_updating(&self) {
            self.started.lock().push("stop");
        }

        async fn next_fix(&self) -> Result<Vec<Coordinate>, LocationError> {
            Ok(Vec::new())
        }
    }

    fn named(name: &str) -> Place {
        Place {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn resolver(sensor: Arc<dyn LocationSensor>, geocoder: Arc<dyn Geocoder>) -> PlaceResolver {
        PlaceResolver::new(sensor, geocoder, Arc::new(NullLogger))
    }

    #[tokio::test]
    async fn test_lookup_uses_first_candidate() {
        let geocoder = ScriptedGeocoder::new(Ok(vec![named("Paris"), named("Paris, TX")]));
        let r = resolver(Arc::new(UnavailableSensor), geocoder.clone());

        let place = r.resolve_by_name("Paris").await.unwrap();
        assert_eq!(place.name.as_deref(), Some("Paris"));
        assert_eq!(geocoder.queries.lock().as_slice(), ["lookup:Paris"]);
    }

    #[tokio::test]
    async fn test_lookup_zero_candidates() {
        let r = resolver(Arc::new(UnavailableSensor), ScriptedGeocoder::new(Ok(vec![])));
        assert_eq!(
            r.resolve_by_name("zzzz").await.unwrap_err(),
            "Lookup error: bad placemark"
        );
    }

    #[tokio::test]
    async fn test_lookup_provider_error_is_tagged() {
        let r = resolver(
            Arc::new(UnavailableSensor),
            ScriptedGeocoder::new(Err(GeocodeError::Status(503))),
        );
        assert_eq!(
            r.resolve_by_name("Paris").await.unwrap_err(),
            "Lookup error: HTTP error 503"
        );
    }

    #[tokio::test]
    async fn test_unknown_error_without_description() {
        let r = resolver(
            Arc::new(FixedLocationSensor::new(Coordinate::new(1.0, 2.0))),
            ScriptedGeocoder::new(Err(GeocodeError::Unknown)),
        );
        assert_eq!(
            r.resolve_current().await.unwrap_err(),
            "Reverse error: unknown error"
        );
    }

    #[tokio::test]
    async fn test_current_reverse_geocodes_first_fix() {
        let geocoder = ScriptedGeocoder::new(Ok(vec![named("Home")]));
        let r = resolver(
            Arc::new(FixedLocationSensor::new(Coordinate::new(45.5, -122.6))),
            geocoder.clone(),
        );

        assert_eq!(r.resolve_current().await.unwrap().name.as_deref(), Some("Home"));
        assert_eq!(geocoder.queries.lock().as_slice(), ["reverse:45.5,-122.6"]);
    }

    #[tokio::test]
    async fn test_current_reverse_zero_candidates() {
        let r = resolver(
            Arc::new(FixedLocationSensor::new(Coordinate::new(0.0, 0.0))),
            ScriptedGeocoder::new(Ok(vec![])),
        );
        assert_eq!(
            r.resolve_current().await.unwrap_err(),
            "Reverse error: bad placemark"
        );
    }

    #[tokio::test]
    async fn test_current_with_no_fixes_stops_sensor() {
        let sensor = Arc::new(EmptySensor {
            started: Mutex::new(Vec::new()),
        });
        let geocoder = ScriptedGeocoder::new(Ok(vec![named("never")]));
        let r = resolver(sensor.clone(), geocoder.clone());

        assert_eq!(
            r.resolve_current().await.unwrap_err(),
            "Received no locations from location sensor."
        );
        assert_eq!(sensor.started.lock().as_slice(), ["start", "stop"]);
        assert!(geocoder.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_current_sensor_error_is_passed_through() {
        let r = resolver(Arc::new(UnavailableSensor), ScriptedGeocoder::new(Ok(vec![])));
        assert_eq!(
            r.resolve_current().await.unwrap_err(),
            LocationError::ServiceUnavailable.to_string()
        );
    }
}
