//! WeatherReport services: persisted state, observers and the `SharedData`
//! orchestrator that ties place resolution, weather refresh and persistence
//! together.

pub mod app;
pub mod observer;
pub mod phase;
pub mod shared_data;
pub mod state;
pub mod store;

pub use app::build_shared_data;
pub use observer::SharedDataObserver;
pub use phase::SharedDataPhase;
pub use shared_data::{
    SharedData, SharedDataChannel, SharedDataCommand, SharedDataEvent, SharedDataHandle,
    SAVED_STATE_KEY,
};
pub use state::{PersistedState, DEFAULT_REFRESH_MINUTES};
pub use store::{FileStore, MemoryStore, StateStore, StoreError, StoreResult};
