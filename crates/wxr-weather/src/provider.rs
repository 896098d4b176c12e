//! Forecast.io current-conditions provider.
//! https://developer.forecast.io/docs/v2

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use wxr_core::Logger;

use crate::format::{build_rows, RowSpec, ValueFormat, ValueSpec};
use crate::source::{CoordinateSlot, WeatherSource};
use crate::types::{Conditions, Coordinate, DisplayRow, Field, WeatherError};

pub const FORECAST_IO_URL: &str = "https://api.forecast.io/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const LOG_PREFIX: &str = "Forecast.IO";

/// Fixed `currently` record served in canned mode
pub const CANNED_CONDITIONS: &str = r#"{
    "apparentTemperature": "44.23",
    "cloudCover": "0.53",
    "dewPoint": "40.83",
    "humidity": "0.84",
    "icon": "partly-cloudy-day",
    "nearestStormBearing": 345,
    "nearestStormDistance": 155,
    "ozone": "285.65",
    "precipIntensity": 0,
    "precipProbability": 0,
    "pressure": "1026.89",
    "summary": "Partly Cloudy",
    "temperature": "45.49",
    "time": 1419783003,
    "visibility": "8.52",
    "windBearing": 33,
    "windSpeed": "2.14"
}"#;

/// Rows shown for current conditions, in display order
pub const FORECAST_ROWS: &[RowSpec] = &[
    RowSpec {
        label: "Summary",
        symbol: Some(Field::Icon),
        values: &[ValueSpec::new(Field::Summary, ValueFormat::Text)],
    },
    RowSpec {
        label: "Time",
        symbol: None,
        values: &[ValueSpec::new(Field::Time, ValueFormat::Time)],
    },
    RowSpec {
        label: "Temperature",
        symbol: None,
        values: &[
            ValueSpec::new(Field::Temperature, ValueFormat::Degrees),
            ValueSpec::new(Field::ApparentTemperature, ValueFormat::Degrees)
                .labeled("feels like")
                .parenthesized(),
        ],
    },
    RowSpec {
        label: "Precipitation",
        symbol: Some(Field::PrecipType),
        values: &[
            ValueSpec::new(Field::PrecipType, ValueFormat::Text),
            ValueSpec::new(Field::PrecipProbability, ValueFormat::Percent),
        ],
    },
    RowSpec {
        label: "Wind",
        symbol: None,
        values: &[
            ValueSpec::new(Field::WindSpeed, ValueFormat::Speed),
            ValueSpec::new(Field::WindBearing, ValueFormat::Bearing)
                .labeled("from")
                .parenthesized(),
        ],
    },
    RowSpec {
        label: "Humidity",
        symbol: None,
        values: &[ValueSpec::new(Field::Humidity, ValueFormat::Percent)],
    },
    RowSpec {
        label: "Pressure",
        symbol: None,
        values: &[ValueSpec::new(Field::Pressure, ValueFormat::Pressure)],
    },
    RowSpec {
        label: "Cloud Cover",
        symbol: None,
        values: &[ValueSpec::new(Field::CloudCover, ValueFormat::Percent)],
    },
    RowSpec {
        label: "Visibility",
        symbol: None,
        values: &[ValueSpec::new(Field::Visibility, ValueFormat::Distance)],
    },
    RowSpec {
        label: "Dew Point",
        symbol: None,
        values: &[ValueSpec::new(Field::DewPoint, ValueFormat::Degrees)],
    },
];

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    currently: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Network,
    Canned,
}

pub struct ForecastIo {
    client: Client,
    base_url: String,
    api_key: String,
    coordinate: CoordinateSlot,
    logger: Arc<dyn Logger>,
    mode: FetchMode,
}

impl ForecastIo {
    pub fn new(api_key: impl Into<String>, logger: Arc<dyn Logger>) -> Result<Self, WeatherError> {
        Self::with_base_url(FORECAST_IO_URL, api_key, logger)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            coordinate: CoordinateSlot::default(),
            logger,
            mode: FetchMode::Network,
        })
    }

    /// Offline source that formats [`CANNED_CONDITIONS`] instead of calling the API
    pub fn canned(logger: Arc<dyn Logger>) -> Result<Self, WeatherError> {
        let mut source = Self::with_base_url(FORECAST_IO_URL, "", logger)?;
        source.mode = FetchMode::Canned;
        Ok(source)
    }

    /// `{base}/{key}/{lat},{lon}`, or `None` without a coordinate
    pub fn forecast_url(&self) -> Option<String> {
        self.coordinate
            .get()
            .map(|c| format!("{}/{}/{}", self.base_url, self.api_key, c))
    }

    /// Format a current-conditions record into display rows
    pub fn forecast_rows(conditions: &Conditions) -> Vec<DisplayRow> {
        build_rows(FORECAST_ROWS, conditions)
    }

    async fn try_fetch(&self) -> Result<Vec<DisplayRow>, WeatherError> {
        let conditions = match self.mode {
            FetchMode::Canned => serde_json::from_str::<Conditions>(CANNED_CONDITIONS)
                .map_err(|e| WeatherError::Parse(e.to_string()))?,
            FetchMode::Network => self.request_conditions().await?,
        };
        Ok(Self::forecast_rows(&conditions))
    }

    async fn request_conditions(&self) -> Result<Conditions, WeatherError> {
        let url = self.forecast_url().ok_or(WeatherError::NoCoordinate)?;
        self.log_debug(&format!("URL: {}", self.redacted(&url)));

        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let currently = body
            .currently
            .filter(serde_json::Value::is_object)
            .ok_or(WeatherError::MissingConditions)?;

        serde_json::from_value(currently).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    fn redacted(&self, url: &str) -> String {
        if self.api_key.is_empty() {
            url.to_string()
        } else {
            url.replace(&self.api_key, "<api-key>")
        }
    }

    fn log_debug(&self, message: &str) {
        self.logger.debug(&format!("{}: {}", LOG_PREFIX, message));
    }

    fn log_error(&self, message: &str) {
        self.logger.error(&format!("{}: {}", LOG_PREFIX, message));
    }
}

#[async_trait]
impl WeatherSource for ForecastIo {
    fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate.get()
    }

    fn set_coordinate(&self, coordinate: Option<Coordinate>) {
        self.coordinate.set(coordinate);
    }

    async fn fetch_conditions(&self) -> Vec<DisplayRow> {
        match self.try_fetch().await {
            Ok(rows) => {
                self.log_debug(&format!("Received {} weather rows.", rows.len()));
                rows
            }
            Err(e) => {
                self.log_error(&e.to_string());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxr_core::TracingLogger;

    fn canned_rows() -> Vec<DisplayRow> {
        let conditions: Conditions = serde_json::from_str(CANNED_CONDITIONS).unwrap();
        ForecastIo::forecast_rows(&conditions)
    }

    fn row<'a>(rows: &'a [DisplayRow], label: &str) -> &'a DisplayRow {
        rows.iter().find(|r| r.label == label).unwrap()
    }

    #[test]
    fn test_canned_rows_in_fixed_order() {
        let labels: Vec<String> = canned_rows().into_iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            [
                "Summary",
                "Time",
                "Temperature",
                "Precipitation",
                "Wind",
                "Humidity",
                "Pressure",
                "Cloud Cover",
                "Visibility",
                "Dew Point"
            ]
        );
    }

    #[test]
    fn test_canned_row_text() {
        let rows = canned_rows();
        assert_eq!(row(&rows, "Temperature").text, "45˚ (feels like 44˚)");
        assert_eq!(row(&rows, "Wind").text, "2 MPH (from NE)");
        assert_eq!(row(&rows, "Humidity").text, "84%");
        assert_eq!(row(&rows, "Pressure").text, "1027 millibars");
        assert_eq!(row(&rows, "Cloud Cover").text, "53%");
        assert_eq!(row(&rows, "Visibility").text, "9 miles");
        assert_eq!(row(&rows, "Dew Point").text, "41˚");
        assert_eq!(row(&rows, "Precipitation").text, "0%");
    }

    #[test]
    fn test_canned_symbols() {
        let rows = canned_rows();
        let summary = row(&rows, "Summary");
        assert_eq!(summary.text, "Partly Cloudy");
        assert_eq!(summary.symbol.as_deref(), Some("partly-cloudy-day"));
        assert_eq!(row(&rows, "Precipitation").symbol, None);
    }

    #[test]
    fn test_forecast_url_requires_coordinate() {
        let source =
            ForecastIo::with_base_url("https://example.test/forecast/", "KEY", TracingLogger::shared())
                .unwrap();
        assert_eq!(source.forecast_url(), None);

        source.set_coordinate(Some(Coordinate::new(37.5, -122.25)));
        assert_eq!(
            source.forecast_url().as_deref(),
            Some("https://example.test/forecast/KEY/37.5,-122.25")
        );
    }

    #[test]
    fn test_redacts_api_key() {
        let source =
            ForecastIo::with_base_url("https://example.test", "SECRET", TracingLogger::shared())
                .unwrap();
        assert_eq!(
            source.redacted("https://example.test/SECRET/1,2"),
            "https://example.test/<api-key>/1,2"
        );
    }

    #[tokio::test]
    async fn test_canned_mode_ignores_coordinate() {
        let source = ForecastIo::canned(TracingLogger::shared()).unwrap();
        let rows = source.fetch_conditions().await;
        assert_eq!(rows.len(), FORECAST_ROWS.len());
    }

    #[tokio::test]
    async fn test_missing_coordinate_yields_empty_rows() {
        let source =
            ForecastIo::with_base_url("http://127.0.0.1:9", "KEY", TracingLogger::shared())
                .unwrap();
        assert!(source.fetch_conditions().await.is_empty());
    }
}
