pub mod config;
pub mod error;
pub mod logger;

pub use config::{
    Config, GeocoderConfig, LocationConfig, SensorKind, ValidationResult, WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, PlaceError, StorageError, WeatherError};
pub use logger::{Logger, TracingLogger};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("WeatherReport core initialized");
    Ok(())
}
