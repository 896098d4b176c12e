//! Location sensors: where is "here".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::types::Coordinate;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Location sensor errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location network error: {0}")]
    Network(String),
    #[error("Location error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LocationError::Timeout
        } else {
            LocationError::Network(e.to_string())
        }
    }
}

impl From<LocationError> for wxr_core::AppError {
    fn from(e: LocationError) -> Self {
        use wxr_core::PlaceError;
        match e {
            LocationError::PermissionDenied => PlaceError::PermissionDenied.into(),
            LocationError::ServiceUnavailable => PlaceError::ServiceUnavailable.into(),
            other => PlaceError::NotFound(other.to_string()).into(),
        }
    }
}

/// A source of position fixes.
///
/// `next_fix` waits for the next batch of fixes; callers use the first one.
/// Sensors must be started before use and stopped once a fix arrives.
#[async_trait]
pub trait LocationSensor: Send + Sync {
    fn start_updating(&self);

    fn stop_updating(&self);

    async fn next_fix(&self) -> Result<Vec<Coordinate>, LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address (ip-api.com response layout)
pub struct IpLocationSensor {
    client: Client,
    lookup_url: String,
    updating: AtomicBool,
}

impl IpLocationSensor {
    pub fn new(lookup_url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            lookup_url: lookup_url.into(),
            updating: AtomicBool::new(false),
        })
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSensor for IpLocationSensor {
    fn start_updating(&self) {
        self.updating.store(true, Ordering::SeqCst);
    }

    fn stop_updating(&self) {
        self.updating.store(false, Ordering::SeqCst);
    }

    async fn next_fix(&self) -> Result<Vec<Coordinate>, LocationError> {
        if !self.is_updating() {
            return Err(LocationError::Other("sensor is not running".to_string()));
        }

        let response = self.client.get(&self.lookup_url).send().await?;
        if !response.status().is_success() {
            return Err(LocationError::Network(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("bad lookup response: {}", e)))?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        Ok(match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => vec![Coordinate::new(lat, lon)],
            _ => Vec::new(),
        })
    }
}

/// Always reports the configured coordinate
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSensor {
    coordinate: Coordinate,
}

impl FixedLocationSensor {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSensor for FixedLocationSensor {
    fn start_updating(&self) {}

    fn stop_updating(&self) {}

    async fn next_fix(&self) -> Result<Vec<Coordinate>, LocationError> {
        Ok(vec![self.coordinate])
    }
}

/// Sensor for hosts without any location capability
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSensor;

#[async_trait]
impl LocationSensor for UnavailableSensor {
    fn start_updating(&self) {}

    fn stop_updating(&self) {}

    async fn next_fix(&self) -> Result<Vec<Coordinate>, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_sensor_reports_coordinate() {
        let sensor = FixedLocationSensor::new(Coordinate::new(1.0, 2.0));
        sensor.start_updating();
        assert_eq!(sensor.next_fix().await.unwrap(), vec![Coordinate::new(1.0, 2.0)]);
    }

    #[tokio::test]
    async fn test_unavailable_sensor_errors() {
        let err = UnavailableSensor.next_fix().await.unwrap_err();
        assert!(matches!(err, LocationError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_ip_sensor_requires_start() {
        let sensor = IpLocationSensor::new("http://127.0.0.1:9/json").unwrap();
        assert!(!sensor.is_updating());
        assert!(sensor.next_fix().await.is_err());

        sensor.start_updating();
        assert!(sensor.is_updating());
        sensor.stop_updating();
        assert!(!sensor.is_updating());
    }

    #[test]
    fn test_permission_maps_to_app_error() {
        let err: wxr_core::AppError = LocationError::PermissionDenied.into();
        assert!(matches!(
            err,
            wxr_core::AppError::Place(wxr_core::PlaceError::PermissionDenied)
        ));
    }
}
