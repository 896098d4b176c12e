use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{Coordinate, DisplayRow};

/// A provider of current conditions for a coordinate.
///
/// `fetch_conditions` never fails: implementations log problems and
/// resolve to an empty row list.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn coordinate(&self) -> Option<Coordinate>;

    fn set_coordinate(&self, coordinate: Option<Coordinate>);

    async fn fetch_conditions(&self) -> Vec<DisplayRow>;
}

/// Shared mutable coordinate slot for source implementations
#[derive(Debug, Default)]
pub struct CoordinateSlot(Mutex<Option<Coordinate>>);

impl CoordinateSlot {
    pub fn get(&self) -> Option<Coordinate> {
        *self.0.lock()
    }

    pub fn set(&self, coordinate: Option<Coordinate>) {
        *self.0.lock() = coordinate;
    }
}
