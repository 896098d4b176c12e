//! Integration tests for the Forecast.io provider using wiremock.

use std::sync::Arc;

use parking_lot::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxr_core::Logger;
use wxr_weather::{Coordinate, ForecastIo, WeatherSource, FORECAST_ROWS};

/// Logger that records error messages
#[derive(Default)]
struct RecordingLogger {
    errors: Mutex<Vec<String>>,
}

impl Logger for RecordingLogger {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
    fn debug(&self, _message: &str) {}
}

async fn source_for(server: &MockServer) -> (ForecastIo, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let source = ForecastIo::with_base_url(
        format!("{}/forecast", server.uri()),
        "test-key",
        logger.clone(),
    )
    .unwrap();
    source.set_coordinate(Some(Coordinate::new(37.5, -122.25)));
    (source, logger)
}

#[tokio::test]
async fn test_fetch_success_formats_currently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast/test-key/37.5,-122.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 37.5,
            "longitude": -122.25,
            "currently": {
                "summary": "Drizzle",
                "icon": "rain",
                "temperature": 51.2,
                "apparentTemperature": "50.1",
                "precipType": "rain",
                "precipProbability": "0.35",
                "windSpeed": 10.6,
                "windBearing": 270,
                "humidity": 0.9
            }
        })))
        .mount(&server)
        .await;

    let (source, logger) = source_for(&server).await;
    let rows = source.fetch_conditions().await;

    assert_eq!(rows.len(), FORECAST_ROWS.len());
    assert_eq!(rows[0].text, "Drizzle");
    assert_eq!(rows[0].symbol.as_deref(), Some("rain"));
    assert_eq!(rows[2].text, "51˚ (feels like 50˚)");
    assert_eq!(rows[3].text, "rain 35%");
    assert_eq!(rows[3].symbol.as_deref(), Some("rain"));
    assert_eq!(rows[4].text, "11 MPH (from W)");
    assert_eq!(rows[6].text, "");
    assert!(logger.errors.lock().is_empty());
}

#[tokio::test]
async fn test_non_success_status_yields_empty_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (source, logger) = source_for(&server).await;
    assert!(source.fetch_conditions().await.is_empty());

    let errors = logger.errors.lock();
    assert_eq!(errors.as_slice(), ["Forecast.IO: HTTP error 403"]);
}

#[tokio::test]
async fn test_missing_currently_yields_empty_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {}
        })))
        .mount(&server)
        .await;

    let (source, logger) = source_for(&server).await;
    assert!(source.fetch_conditions().await.is_empty());
    assert!(logger.errors.lock()[0].contains("current conditions"));
}

#[tokio::test]
async fn test_unparsable_body_yields_empty_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (source, logger) = source_for(&server).await;
    assert!(source.fetch_conditions().await.is_empty());
    assert!(logger.errors.lock()[0].starts_with("Forecast.IO: failed to parse response"));
}

#[tokio::test]
async fn test_no_coordinate_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (source, logger) = source_for(&server).await;
    source.set_coordinate(None);

    assert!(source.fetch_conditions().await.is_empty());
    assert_eq!(
        logger.errors.lock().as_slice(),
        ["Forecast.IO: failed to construct URL"]
    );
}
