use serde::{Deserialize, Serialize};

/// Geographic coordinate in signed degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One label/value(/symbol) unit shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub label: String,
    pub text: String,
    pub symbol: Option<String>,
}

/// Fields of the provider's current-conditions record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Summary,
    Icon,
    Time,
    Temperature,
    ApparentTemperature,
    PrecipType,
    PrecipProbability,
    WindSpeed,
    WindBearing,
    Humidity,
    Pressure,
    CloudCover,
    Visibility,
    DewPoint,
}

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Epoch(i64),
}

impl FieldValue<'_> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            FieldValue::Number(v) => Some(v),
            FieldValue::Epoch(v) => Some(v as f64),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_epoch(&self) -> Option<i64> {
        match *self {
            FieldValue::Epoch(v) => Some(v),
            FieldValue::Number(v) => Some(v as i64),
            FieldValue::Text(_) => None,
        }
    }
}

/// Current conditions as reported by the provider.
///
/// The provider serializes several numbers as strings; every numeric field
/// accepts either form. Values of the wrong type decode as absent instead of
/// failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    #[serde(default, deserialize_with = "loose::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "loose::integer")]
    pub time: Option<i64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub apparent_temperature: Option<f64>,
    #[serde(default, deserialize_with = "loose::text")]
    pub precip_type: Option<String>,
    #[serde(default, deserialize_with = "loose::number")]
    pub precip_probability: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub wind_bearing: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub cloud_cover: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub visibility: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub dew_point: Option<f64>,
}

impl Conditions {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        let number = match field {
            Field::Summary => return self.summary.as_deref().map(FieldValue::Text),
            Field::Icon => return self.icon.as_deref().map(FieldValue::Text),
            Field::PrecipType => return self.precip_type.as_deref().map(FieldValue::Text),
            Field::Time => return self.time.map(FieldValue::Epoch),
            Field::Temperature => self.temperature,
            Field::ApparentTemperature => self.apparent_temperature,
            Field::PrecipProbability => self.precip_probability,
            Field::WindSpeed => self.wind_speed,
            Field::WindBearing => self.wind_bearing,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::CloudCover => self.cloud_cover,
            Field::Visibility => self.visibility,
            Field::DewPoint => self.dew_point,
        };
        number.map(FieldValue::Number)
    }
}

/// Lenient decoders for provider fields
mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        })
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|v| v as i64)),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("failed to construct URL")]
    NoCoordinate,
    #[error("{0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error {0}")]
    Status(u16),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("failed to access current conditions")]
    MissingConditions,
}

impl From<WeatherError> for wxr_core::AppError {
    fn from(e: WeatherError) -> Self {
        use wxr_core::{error::ReqwestErrorExt, WeatherError as CoreWeatherError};
        match e {
            WeatherError::Network(err) => wxr_core::AppError::Network(err.into_network_error()),
            WeatherError::Status(401) | WeatherError::Status(403) => {
                wxr_core::AppError::Weather(CoreWeatherError::InvalidApiKey)
            }
            WeatherError::Status(status) if status >= 500 => {
                wxr_core::AppError::Weather(CoreWeatherError::ServiceUnavailable)
            }
            other => wxr_core::AppError::Weather(CoreWeatherError::ApiError(other.to_string())),
        }
    }
}
