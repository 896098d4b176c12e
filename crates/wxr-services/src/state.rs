//! Persisted application state.

use serde::{Deserialize, Serialize};
use wxr_weather::Place;

/// Default weather refresh period
pub const DEFAULT_REFRESH_MINUTES: u32 = 60;

/// State that survives restarts: the chosen place and the refresh period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub place: Option<Place>,

    #[serde(default = "default_refresh_minutes")]
    pub refresh_interval_minutes: u32,
}

fn default_refresh_minutes() -> u32 {
    DEFAULT_REFRESH_MINUTES
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            place: None,
            refresh_interval_minutes: DEFAULT_REFRESH_MINUTES,
        }
    }
}

impl PersistedState {
    pub fn with_refresh_minutes(refresh_interval_minutes: u32) -> Self {
        Self {
            place: None,
            refresh_interval_minutes,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
