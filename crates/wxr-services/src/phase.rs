//! Orchestrator phase tracking (load, place resolution, weather refresh).

/// What the orchestrator is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharedDataPhase {
    #[default]
    Uninitialized,
    Loading,
    Idle,
    ResolvingPlace,
    ResolvingWeather,
}

impl SharedDataPhase {
    /// State after `load` begins.
    pub fn on_load_started(self) -> Self {
        SharedDataPhase::Loading
    }

    /// State after `load` finishes without restoring a place.
    pub fn on_load_done(self) -> Self {
        SharedDataPhase::Idle
    }

    /// State after a place request is issued.
    pub fn on_place_requested(self) -> Self {
        SharedDataPhase::ResolvingPlace
    }

    /// State after a weather request is issued.
    ///
    /// A place request in flight takes precedence: its completion issues
    /// another refresh anyway.
    pub fn on_weather_requested(self) -> Self {
        match self {
            SharedDataPhase::ResolvingPlace => SharedDataPhase::ResolvingPlace,
            _ => SharedDataPhase::ResolvingWeather,
        }
    }

    /// State after the latest place request completes (success or failure).
    pub fn on_place_done(self) -> Self {
        SharedDataPhase::Idle
    }

    /// State after the latest weather request completes.
    pub fn on_weather_done(self) -> Self {
        match self {
            SharedDataPhase::ResolvingPlace => SharedDataPhase::ResolvingPlace,
            _ => SharedDataPhase::Idle,
        }
    }
}
