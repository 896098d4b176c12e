//! Observers of orchestrator state.

use wxr_weather::{DisplayRow, Place};

/// Receives place, weather and log updates from `SharedData`.
///
/// Every method is invoked on the control loop that owns `SharedData`.
/// Place and weather updates reach every observer; info and error messages
/// only reach observers that report themselves active at dispatch time.
pub trait SharedDataObserver: Send {
    fn on_place_changed(&mut self, place: Option<&Place>);

    fn on_weather_changed(&mut self, rows: &[DisplayRow]);

    fn on_info(&mut self, message: &str);

    fn on_error(&mut self, message: &str);

    fn is_active(&self) -> bool {
        true
    }
}
