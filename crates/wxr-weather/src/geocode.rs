//! Forward and reverse geocoding.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::place::Place;
use crate::types::Coordinate;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const SEARCH_LIMIT: &str = "5";

/// Geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("{0}")]
    Network(String),
    #[error("HTTP error {0}")]
    Status(u16),
    #[error("bad response: {0}")]
    Parse(String),
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    /// The provider produced neither results nor an error description
    #[error("unknown error")]
    Unknown,
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::Network(e.to_string())
    }
}

impl From<url::ParseError> for GeocodeError {
    fn from(e: url::ParseError) -> Self {
        GeocodeError::InvalidUrl(e.to_string())
    }
}

impl From<GeocodeError> for wxr_core::AppError {
    fn from(e: GeocodeError) -> Self {
        use wxr_core::{ConfigError, NetworkError, PlaceError};
        match e {
            GeocodeError::Network(msg) => NetworkError::ConnectionFailed(msg).into(),
            GeocodeError::Status(status) => NetworkError::ServerError {
                status,
                message: "geocoder request failed".to_string(),
            }
            .into(),
            GeocodeError::Parse(msg) => NetworkError::InvalidResponse(msg).into(),
            GeocodeError::InvalidUrl(msg) => ConfigError::Invalid(msg).into(),
            GeocodeError::Unknown => PlaceError::NotFound("unknown error".to_string()).into(),
        }
    }
}

/// Converts between free text, coordinates and places.
///
/// Both directions return every candidate the provider produced, best first.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode_address(&self, text: &str) -> Result<Vec<Place>, GeocodeError>;

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<Place>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<String>,
    lon: Option<String>,
    name: Option<String>,
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    hamlet: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country_code: Option<String>,
}

/// Reverse lookups answer with a single object, or `{"error": ...}` when nothing matched
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    NotFound { error: String },
    Found(NominatimPlace),
}

impl NominatimPlace {
    fn into_place(self) -> Place {
        let coordinate = match (
            self.lat.as_deref().and_then(|v| v.parse::<f64>().ok()),
            self.lon.as_deref().and_then(|v| v.parse::<f64>().ok()),
        ) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        };

        let name = self.name.filter(|n| !n.is_empty()).or_else(|| {
            self.display_name
                .as_deref()
                .and_then(|d| d.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        });

        let mut place = Place {
            name,
            coordinate,
            ..Default::default()
        };

        if let Some(addr) = self.address {
            // Prefer city > town > village > municipality > hamlet
            place.city = addr
                .city
                .or(addr.town)
                .or(addr.village)
                .or(addr.municipality)
                .or(addr.hamlet);
            place.house_number = addr.house_number;
            place.street = addr.road;
            place.region = addr.state;
            place.postal_code = addr.postcode;
            place.country_code = addr.country_code.map(|c| c.to_uppercase());
        }

        place
    }
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, GeocodeError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            tracing::debug!("Geocode returned status {}", response.status());
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode_address(&self, text: &str) -> Result<Vec<Place>, GeocodeError> {
        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[
                ("q", text),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", SEARCH_LIMIT),
            ],
        )?;

        let results: Vec<NominatimPlace> = self.get_json(url).await?;
        Ok(results.into_iter().map(NominatimPlace::into_place).collect())
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<Place>, GeocodeError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let url = Url::parse_with_params(
            &format!("{}/reverse", self.base_url),
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
            ],
        )?;

        match self.get_json::<ReverseResponse>(url).await? {
            ReverseResponse::Found(place) => Ok(vec![place.into_place()]),
            ReverseResponse::NotFound { error } => {
                tracing::debug!("Reverse geocode found nothing: {}", error);
                Ok(Vec::new())
            }
        }
    }
}
