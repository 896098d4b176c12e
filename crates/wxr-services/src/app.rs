//! Wires a `SharedData` from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use wxr_core::{AppError, Config, SensorKind};
use wxr_weather::{
    Coordinate, FixedLocationSensor, ForecastIo, IpLocationSensor, LocationSensor,
    NominatimGeocoder, PlaceResolver, UnavailableSensor, WeatherSource,
};

use crate::shared_data::{SharedData, SharedDataChannel};
use crate::state::PersistedState;
use crate::store::FileStore;

/// Build the orchestrator described by `config`.
///
/// State is stored under `config.state_dir()`. The orchestrator is not
/// loaded yet; call `SharedData::load` from inside the runtime.
pub fn build_shared_data(config: &Config) -> Result<SharedData> {
    let channel = SharedDataChannel::new();
    let logger = channel.logger();

    let weather: Arc<dyn WeatherSource> = if config.weather.use_canned_data {
        tracing::info!("Serving canned weather conditions");
        Arc::new(ForecastIo::canned(logger.clone()).map_err(AppError::from)?)
    } else {
        match config.weather.effective_api_key() {
            Some(key) => Arc::new(ForecastIo::with_base_url(
                config.weather.base_url.clone(),
                key,
                logger.clone(),
            )
            .map_err(AppError::from)?),
            None => {
                tracing::warn!("No Forecast.io API key configured; serving canned conditions");
                Arc::new(ForecastIo::canned(logger.clone()).map_err(AppError::from)?)
            }
        }
    };

    let sensor = location_sensor(config)?;
    let geocoder = NominatimGeocoder::new(
        config.geocoder.base_url.clone(),
        &config.geocoder.user_agent,
    )
    .map_err(AppError::from)
    .context("Failed to create geocoder")?;
    let resolver = PlaceResolver::new(sensor, Arc::new(geocoder), logger);

    let store = Arc::new(FileStore::new(config.state_dir()));
    let initial = PersistedState::with_refresh_minutes(config.weather.refresh_minutes);

    Ok(SharedData::new(channel, weather, resolver, store, initial))
}

fn location_sensor(config: &Config) -> Result<Arc<dyn LocationSensor>> {
    let location = &config.location;
    let sensor: Arc<dyn LocationSensor> = match location.sensor {
        SensorKind::Ip => Arc::new(
            IpLocationSensor::new(location.ip_lookup_url.clone())
                .map_err(AppError::from)
                .context("Failed to create IP location sensor")?,
        ),
        SensorKind::Fixed => match (location.latitude, location.longitude) {
            (Some(lat), Some(lon)) => Arc::new(FixedLocationSensor::new(Coordinate::new(lat, lon))),
            _ => {
                tracing::warn!("Fixed location sensor needs latitude and longitude");
                Arc::new(UnavailableSensor)
            }
        },
        SensorKind::None => Arc::new(UnavailableSensor),
    };
    Ok(sensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config {
            config_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        config.weather.use_canned_data = true;
        config
    }

    #[test]
    fn test_build_seeds_refresh_interval() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.weather.refresh_minutes = 15;

        let shared = build_shared_data(&config).unwrap();
        assert_eq!(shared.state().refresh_interval_minutes, 15);
        assert!(shared.place().is_none());
    }

    #[test]
    fn test_every_sensor_kind_builds() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        for kind in [SensorKind::Ip, SensorKind::Fixed, SensorKind::None] {
            config.location.sensor = kind;
            assert!(location_sensor(&config).is_ok());
        }
    }
}
