//! SharedData: the orchestrator that owns the current place, the current
//! weather rows and the persisted state.
//!
//! All state mutation and observer notification happen on the task that
//! owns `SharedData`. Network, sensor and timer work runs on spawned tokio
//! tasks which report back through an unbounded channel; `step` consumes one
//! event at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use wxr_core::{AppError, Logger, StorageError};
use wxr_weather::{DisplayRow, Place, PlaceResolution, PlaceResolver, WeatherSource};

use crate::observer::SharedDataObserver;
use crate::phase::SharedDataPhase;
use crate::state::PersistedState;
use crate::store::StateStore;

/// Key the persisted state is stored under
pub const SAVED_STATE_KEY: &str = "SavedState";

/// Requests queued through a `SharedDataHandle`
#[derive(Debug, Clone, PartialEq)]
pub enum SharedDataCommand {
    SetPlaceToSearch(String),
    SetPlaceToCurrent,
    RefreshWeather,
    Save,
    Shutdown,
}

/// Messages delivered to the control loop
#[derive(Debug)]
pub enum SharedDataEvent {
    Command(SharedDataCommand),
    PlaceResolved {
        generation: u64,
        result: PlaceResolution,
    },
    WeatherFetched {
        generation: u64,
        rows: Vec<DisplayRow>,
    },
    TimerFired,
    Info(String),
    Error(String),
}

/// Logger that emits tracing events and queues info/error messages for
/// observer dispatch on the control loop
struct ChannelLogger {
    tx: UnboundedSender<SharedDataEvent>,
}

impl Logger for ChannelLogger {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
        let _ = self.tx.send(SharedDataEvent::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
        let _ = self.tx.send(SharedDataEvent::Error(message.to_string()));
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Cloneable, thread-safe way to queue commands for a `SharedData`
#[derive(Debug, Clone)]
pub struct SharedDataHandle {
    tx: UnboundedSender<SharedDataEvent>,
}

impl SharedDataHandle {
    /// Returns false once the owning `SharedData` is gone.
    pub fn send(&self, command: SharedDataCommand) -> bool {
        self.tx.send(SharedDataEvent::Command(command)).is_ok()
    }

    pub fn set_place_to_search(&self, text: impl Into<String>) -> bool {
        self.send(SharedDataCommand::SetPlaceToSearch(text.into()))
    }

    pub fn set_place_to_current(&self) -> bool {
        self.send(SharedDataCommand::SetPlaceToCurrent)
    }

    pub fn refresh_weather(&self) -> bool {
        self.send(SharedDataCommand::RefreshWeather)
    }

    pub fn save(&self) -> bool {
        self.send(SharedDataCommand::Save)
    }

    pub fn shutdown(&self) -> bool {
        self.send(SharedDataCommand::Shutdown)
    }
}

/// The event channel a `SharedData` runs on.
///
/// Created first so the weather source and place resolver can be handed the
/// channel's logger before the orchestrator itself exists.
pub struct SharedDataChannel {
    tx: UnboundedSender<SharedDataEvent>,
    rx: UnboundedReceiver<SharedDataEvent>,
}

impl SharedDataChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::new(ChannelLogger {
            tx: self.tx.clone(),
        })
    }

    pub fn handle(&self) -> SharedDataHandle {
        SharedDataHandle {
            tx: self.tx.clone(),
        }
    }
}

impl Default for SharedDataChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SharedData {
    state: PersistedState,
    weather_rows: Vec<DisplayRow>,
    phase: SharedDataPhase,
    observers: Vec<Box<dyn SharedDataObserver>>,

    weather: Arc<dyn WeatherSource>,
    resolver: Arc<PlaceResolver>,
    store: Arc<dyn StateStore>,
    logger: Arc<dyn Logger>,

    tx: UnboundedSender<SharedDataEvent>,
    rx: UnboundedReceiver<SharedDataEvent>,

    // Latest issued request generations; older completions are dropped
    place_generation: u64,
    weather_generation: u64,

    timer_started: bool,
    timer: Option<JoinHandle<()>>,
    shutdown: bool,
}

impl SharedData {
    pub fn new(
        channel: SharedDataChannel,
        weather: Arc<dyn WeatherSource>,
        resolver: PlaceResolver,
        store: Arc<dyn StateStore>,
        initial_state: PersistedState,
    ) -> Self {
        let logger = channel.logger();
        Self {
            state: initial_state,
            weather_rows: Vec::new(),
            phase: SharedDataPhase::default(),
            observers: Vec::new(),
            weather,
            resolver: Arc::new(resolver),
            store,
            logger,
            tx: channel.tx,
            rx: channel.rx,
            place_generation: 0,
            weather_generation: 0,
            timer_started: false,
            timer: None,
            shutdown: false,
        }
    }

    /// Add an observer. Observers are never removed.
    pub fn register(&mut self, observer: Box<dyn SharedDataObserver>) {
        self.observers.push(observer);
    }

    pub fn handle(&self) -> SharedDataHandle {
        SharedDataHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn place(&self) -> Option<&Place> {
        self.state.place.as_ref()
    }

    pub fn weather_rows(&self) -> &[DisplayRow] {
        &self.weather_rows
    }

    pub fn phase(&self) -> SharedDataPhase {
        self.phase
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Restore persisted state and replay it as a place update.
    ///
    /// A missing or unreadable blob leaves the current state untouched.
    pub fn load(&mut self) {
        self.phase = self.phase.on_load_started();

        let bytes = match self.store.read(SAVED_STATE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.logger.info("Saved state data not found.");
                self.phase = self.phase.on_load_done();
                return;
            }
            Err(e) => {
                self.logger.warn(&format!("Failed to read saved state: {}", e));
                self.phase = self.phase.on_load_done();
                return;
            }
        };

        let restored = match PersistedState::from_bytes(&bytes) {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!("{}", StorageError::Corrupt(e.to_string()));
                self.logger.warn("Ignored bad saved state data.");
                self.phase = self.phase.on_load_done();
                return;
            }
        };

        self.logger.debug("Loaded saved data.");
        self.state = restored;
        self.phase = self.phase.on_load_done();

        let place = self.state.place.clone();
        self.handle_place_update(place, None);
    }

    /// Write the current state. Failures are logged, never returned.
    pub fn save(&self) {
        let bytes = match self.state.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.logger.error(&format!("Failed to encode saved state: {}", e));
                return;
            }
        };

        if let Err(e) = self.store.write(SAVED_STATE_KEY, &bytes) {
            self.logger.error(&AppError::from(e).to_string());
        }
    }

    /// Clear the current place and geocode `text` in the background.
    pub fn set_place_to_search(&mut self, text: &str) {
        self.state.place = None;
        let generation = self.next_place_generation();

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let result = resolver.resolve_by_name(&text).await;
            let _ = tx.send(SharedDataEvent::PlaceResolved { generation, result });
        });
    }

    /// Resolve the current position in the background.
    pub fn set_place_to_current(&mut self) {
        let generation = self.next_place_generation();

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve_current().await;
            let _ = tx.send(SharedDataEvent::PlaceResolved { generation, result });
        });
    }

    /// Fetch conditions in the background. The first call also starts the
    /// recurring refresh timer.
    pub fn refresh_weather(&mut self) {
        self.start_timer();

        self.weather_generation += 1;
        let generation = self.weather_generation;
        self.phase = self.phase.on_weather_requested();
        self.logger.debug("Requesting weather...");

        let weather = Arc::clone(&self.weather);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let rows = weather.fetch_conditions().await;
            let _ = tx.send(SharedDataEvent::WeatherFetched { generation, rows });
        });
    }

    /// Wait for and process one event.
    ///
    /// Returns false once shutdown has been requested.
    pub async fn step(&mut self) -> bool {
        if self.shutdown {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => self.dispatch(event),
            None => self.shutdown = true,
        }
        !self.shutdown
    }

    /// Process events until shutdown.
    pub async fn run(&mut self) {
        while self.step().await {}
        tracing::debug!("SharedData control loop stopped");
    }

    fn dispatch(&mut self, event: SharedDataEvent) {
        match event {
            SharedDataEvent::Command(command) => self.apply(command),
            SharedDataEvent::PlaceResolved { generation, result } => {
                if generation != self.place_generation {
                    tracing::debug!(
                        "Ignoring stale place result (generation {}, latest {})",
                        generation,
                        self.place_generation
                    );
                    return;
                }
                self.phase = self.phase.on_place_done();
                match result {
                    Ok(place) => self.handle_place_update(Some(place), None),
                    Err(error) => self.handle_place_update(None, Some(error)),
                }
            }
            SharedDataEvent::WeatherFetched { generation, rows } => {
                if generation != self.weather_generation {
                    tracing::debug!(
                        "Ignoring stale weather result (generation {}, latest {})",
                        generation,
                        self.weather_generation
                    );
                    return;
                }
                self.phase = self.phase.on_weather_done();
                self.weather_rows = rows;
                self.logger.debug("Received weather data.");
                for observer in &mut self.observers {
                    observer.on_weather_changed(&self.weather_rows);
                }
            }
            SharedDataEvent::TimerFired => self.refresh_weather(),
            SharedDataEvent::Info(message) => {
                for observer in self.observers.iter_mut().filter(|o| o.is_active()) {
                    observer.on_info(&message);
                }
            }
            SharedDataEvent::Error(message) => {
                for observer in self.observers.iter_mut().filter(|o| o.is_active()) {
                    observer.on_error(&message);
                }
            }
        }
    }

    fn apply(&mut self, command: SharedDataCommand) {
        match command {
            SharedDataCommand::SetPlaceToSearch(text) => self.set_place_to_search(&text),
            SharedDataCommand::SetPlaceToCurrent => self.set_place_to_current(),
            SharedDataCommand::RefreshWeather => self.refresh_weather(),
            SharedDataCommand::Save => self.save(),
            SharedDataCommand::Shutdown => {
                self.shutdown = true;
                self.stop_timer();
            }
        }
    }

    fn next_place_generation(&mut self) -> u64 {
        self.place_generation += 1;
        self.phase = self.phase.on_place_requested();
        self.place_generation
    }

    /// Exactly one of `place` / `error` is expected; neither means an
    /// unexplained failure.
    fn handle_place_update(&mut self, place: Option<Place>, error: Option<String>) {
        self.state.place = place;
        for observer in &mut self.observers {
            observer.on_place_changed(self.state.place.as_ref());
        }
        self.save();

        // A failed lookup clears the coordinate
        self.weather
            .set_coordinate(self.state.place.as_ref().and_then(|p| p.coordinate));

        match (&self.state.place, error) {
            (Some(place), _) => {
                self.logger
                    .debug(&format!("Set place to {}", place.short_name()));
            }
            (None, Some(error)) if !error.is_empty() => self.logger.error(&error),
            (None, _) => self.logger.error("Unknown error retrieving place."),
        }

        self.refresh_weather();
    }

    fn start_timer(&mut self) {
        if self.timer_started {
            return;
        }
        self.timer_started = true;

        let minutes = self.state.refresh_interval_minutes;
        if minutes == 0 {
            self.logger.debug("Weather refresh timer disabled.");
            return;
        }

        let period = Duration::from_secs(u64::from(minutes) * 60);
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(SharedDataEvent::TimerFired).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!("Weather refresh timer started ({} min)", minutes);
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SharedData {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
