//! Integration tests for Nominatim geocoding and IP location using wiremock.

use std::sync::Arc;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxr_core::TracingLogger;
use wxr_weather::{
    Coordinate, GeocodeError, Geocoder, IpLocationSensor, LocationError, LocationSensor,
    NominatimGeocoder, PlaceResolver,
};

const USER_AGENT: &str = "WeatherReport/test";

fn geocoder_for(server: &MockServer) -> NominatimGeocoder {
    NominatimGeocoder::new(server.uri(), USER_AGENT).unwrap()
}

#[tokio::test]
async fn test_search_maps_results_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Portland"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("addressdetails", "1"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "lat": "45.5202471",
                "lon": "-122.674194",
                "name": "Portland",
                "address": {
                    "city": "Portland",
                    "state": "Oregon",
                    "country_code": "us"
                }
            },
            {
                "lat": "43.6573605",
                "lon": "-70.2586618",
                "name": "Portland",
                "address": { "city": "Portland", "state": "Maine", "country_code": "us" }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let places = geocoder_for(&server)
        .geocode_address("Portland")
        .await
        .unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].one_line_address(), "Portland, OR, US");
    assert_eq!(places[1].region.as_deref(), Some("Maine"));
    assert_eq!(
        places[0].coordinate,
        Some(Coordinate::new(45.5202471, -122.674194))
    );
}

#[tokio::test]
async fn test_reverse_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "0"))
        .and(query_param("lon", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
        )
        .mount(&server)
        .await;

    let places = geocoder_for(&server)
        .reverse_geocode(Coordinate::new(0.0, 0.0))
        .await
        .unwrap();
    assert!(places.is_empty());
}

#[tokio::test]
async fn test_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = geocoder_for(&server)
        .geocode_address("anywhere")
        .await
        .unwrap_err();
    assert!(matches!(err, GeocodeError::Status(429)));
}

#[tokio::test]
async fn test_ip_sensor_then_reverse_resolves_place() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 40.7128,
            "lon": -74.006
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "40.7128"))
        .and(query_param("lon", "-74.006"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lat": "40.7127281",
            "lon": "-74.0060152",
            "name": "City Hall",
            "address": {
                "house_number": "260",
                "road": "Broadway",
                "city": "New York",
                "state": "New York",
                "postcode": "10007",
                "country_code": "us"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sensor = IpLocationSensor::new(format!("{}/json", server.uri())).unwrap();
    let resolver = PlaceResolver::new(
        Arc::new(sensor),
        Arc::new(geocoder_for(&server)),
        TracingLogger::shared(),
    );

    let place = resolver.resolve_current().await.unwrap();
    assert_eq!(place.short_name(), "City Hall");
    assert_eq!(
        place.one_line_address(),
        "260 Broadway, New York, NY, US 10007"
    );
}

#[tokio::test]
async fn test_ip_sensor_reports_failure_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&server)
        .await;

    let sensor = IpLocationSensor::new(format!("{}/json", server.uri())).unwrap();
    sensor.start_updating();
    let err = sensor.next_fix().await.unwrap_err();
    assert!(matches!(err, LocationError::Other(ref m) if m == "private range"));
}
