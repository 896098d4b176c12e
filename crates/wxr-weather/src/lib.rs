//! Weather conditions and places for WeatherReport
//!
//! Decodes the provider's current-conditions record and turns it into
//! ordered display rows, and resolves free text or the current position
//! into a place.

pub mod format;
pub mod geocode;
pub mod location;
pub mod place;
pub mod provider;
pub mod resolver;
pub mod source;
pub mod types;

pub use format::{bearing_name, build_rows, format_double, RowSpec, ValueFormat, ValueSpec};
pub use geocode::{GeocodeError, Geocoder, NominatimGeocoder, NOMINATIM_URL};
pub use location::{
    FixedLocationSensor, IpLocationSensor, LocationError, LocationSensor, UnavailableSensor,
};
pub use place::{state_abbreviation, Place};
pub use provider::{ForecastIo, CANNED_CONDITIONS, FORECAST_ROWS};
pub use resolver::{GeocodeDirection, PlaceResolution, PlaceResolver};
pub use source::{CoordinateSlot, WeatherSource};
pub use types::*;
