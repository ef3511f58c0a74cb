//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the shared flags, the record store and every port
//! adapter.  Each background task is a *step* method that does one pass
//! and returns how long to sleep before the next; the supervisor in
//! [`crate::scheduler`] loops them.
//!
//! ```text
//!   ClockPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  NetworkPort ◀─▶│          AppService          │ ──▶ DisplayPort
//!  StoragePort ◀─▶│ time sync · schedule · door  │ ──▶ ActuatorPort
//!                 └──────────────────────────────┘      (behind mutex)
//! ```
//!
//! ## Borrow discipline
//!
//! Adapters live in `RefCell`s because all tasks share `&self`.  No
//! `RefCell` borrow is held across an `.await`; the only thing held over
//! a suspension is the door mutex, which serialises every transition.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use log::{debug, info, warn};

use crate::calendar::{effective_offset, DateTime};
use crate::config::{Location, NetworkConfig, SystemConfig};
use crate::door::{scheduled_action, Door, DoorAction, DoorStatus};
use crate::error::Result;
use crate::solar;

use super::commands::{AppCommand, CommandReply, DoorView, NetworkView};
use super::events::{AppEvent, Trigger};
use super::frame::{self, Frame, Screen};
use super::ports::{ActuatorPort, ClockPort, DisplayPort, EventSink, NetworkError, NetworkPort, StoragePort};
use super::state::{Flag, SharedState};
use super::store::DataStore;

fn secs(s: u32) -> Duration {
    Duration::from_secs(u64::from(s))
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<S, C, N, D, A, E>
where
    S: StoragePort,
    C: ClockPort,
    N: NetworkPort,
    D: DisplayPort,
    A: ActuatorPort,
    E: EventSink,
{
    config: SystemConfig,
    state: SharedState,
    store: RefCell<DataStore<S>>,
    clock: C,
    net: RefCell<N>,
    display: RefCell<D>,
    door: Mutex<NoopRawMutex, Door<A>>,
    sink: RefCell<E>,
}

impl<S, C, N, D, A, E> AppService<S, C, N, D, A, E>
where
    S: StoragePort,
    C: ClockPort,
    N: NetworkPort,
    D: DisplayPort,
    A: ActuatorPort,
    E: EventSink,
{
    pub fn new(config: SystemConfig, storage: S, clock: C, net: N, display: D, actuator: A, sink: E) -> Self {
        Self {
            config,
            state: SharedState::new(),
            store: RefCell::new(DataStore::new(storage)),
            clock,
            net: RefCell::new(net),
            display: RefCell::new(display),
            door: Mutex::new(Door::new(actuator)),
            sink: RefCell::new(sink),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up networking: start or stop the setup AP according to the
    /// stored policy, then try the station connection.  Sets `Ready`.
    pub fn boot(&self) {
        let network = self.store.borrow().network();
        let ap_allowed = network.as_ref().is_none_or(NetworkConfig::allows_ap);

        let access_point = if ap_allowed {
            self.start_access_point()
        } else {
            self.stop_access_point();
            false
        };
        if let Some(network) = &network {
            self.connect_station(network, false);
        }

        self.state.set(Flag::Ready, true);
        self.emit(&AppEvent::Started { access_point });
        info!("AppService: ready (access point {})", if access_point { "up" } else { "down" });
    }

    /// Draw the power-on splash.
    pub fn show_splash(&self) {
        self.draw(&frame::splash());
    }

    // ── Task steps ────────────────────────────────────────────

    /// One pass of the time-sync task.
    pub fn time_sync_step(&self) -> Duration {
        let timing = &self.config.timing;
        if !self.net.borrow().is_connected() {
            debug!("TimeSync: no connection, retrying in {}s", timing.time_sync_retry_secs);
            return secs(timing.time_sync_retry_secs);
        }
        match self.clock.sync_time() {
            Ok(()) => {
                self.state.set(Flag::TimeSet, true);
                self.state.set(Flag::DisplayUpdated, true);
                info!("TimeSync: clock set ({})", self.clock.now());
                self.emit(&AppEvent::TimeSynced);
                secs(timing.time_sync_secs)
            }
            Err(e) => {
                warn!("TimeSync: {}, retrying in {}s", e, timing.time_sync_retry_secs);
                self.emit(&AppEvent::TimeSyncFailed(e));
                secs(timing.time_sync_retry_secs)
            }
        }
    }

    /// One pass of the schedule task: compute and cache today's sunrise
    /// and sunset unless already cached.
    pub fn schedule_step(&self) -> Duration {
        let timing = &self.config.timing;
        if !self.state.get(Flag::TimeSet) {
            debug!("Schedule: time not set, retrying in {}s", timing.schedule_retry_secs);
            return secs(timing.schedule_retry_secs);
        }
        let Some(location) = self.store.borrow().location() else {
            debug!("Schedule: no location, retrying in {}s", timing.schedule_retry_secs);
            return secs(timing.schedule_retry_secs);
        };

        let utc = self.clock.now();
        let now = utc.in_timezone(&location.timezone);
        if self.store.borrow().sun_schedule(&now.date()).is_some() {
            return secs(timing.schedule_secs);
        }

        let offset = effective_offset(&location.timezone, &utc);
        info!("Schedule: computing for {} (UTC{:+})", now.date(), offset);
        match solar::sun_times(&now, location.latitude, location.longitude, f64::from(offset)) {
            Ok(schedule) => {
                if let Err(e) = self.store.borrow_mut().save_sun_schedule(&schedule) {
                    warn!("Schedule: could not cache: {}", e);
                }
                self.state.set(Flag::DisplayUpdated, true);
                self.emit(&AppEvent::ScheduleComputed(schedule));
            }
            Err(reason) => {
                warn!("Schedule: none for {}: {}", now.date(), reason);
                self.emit(&AppEvent::ScheduleUnavailable {
                    date: now.date(),
                    reason,
                });
            }
        }
        secs(timing.schedule_secs)
    }

    /// One pass of the door-check task.
    pub async fn door_check_step(&self) -> Duration {
        let timing = &self.config.timing;
        if !self.state.get(Flag::TimeSet) {
            debug!("DoorCheck: time not set, retrying in {}s", timing.door_check_retry_secs);
            return secs(timing.door_check_retry_secs);
        }
        let Some(location) = self.store.borrow().location() else {
            debug!("DoorCheck: no location, retrying in {}s", timing.door_check_retry_secs);
            return secs(timing.door_check_retry_secs);
        };

        let now = self.local_now(Some(&location));
        let (schedule, status) = {
            let store = self.store.borrow();
            (store.sun_schedule(&now.date()), store.door_status())
        };

        if let Some(schedule) = schedule {
            debug!("DoorCheck: {} at {:02}:{:02}", status, now.hour(), now.minute());
            if let Some(action) = scheduled_action(status, &now, &schedule) {
                if let Err(e) = self.actuate(action, Trigger::Schedule).await {
                    debug!("DoorCheck: scheduled {:?} not done: {}", action, e);
                }
            }
            self.state.set(Flag::DisplayUpdated, true);
        }
        secs(timing.door_check_secs)
    }

    /// One pass of the display task.
    pub fn display_step(&self) -> Duration {
        if self.state.get(Flag::DisplayUpdated) {
            let frame = self.render_frame();
            self.draw(&frame);
        }
        secs(self.config.timing.display_secs)
    }

    /// Build the frame the display would show right now.
    pub fn render_frame(&self) -> Frame {
        frame::render(&self.screen())
    }

    // ── Door ──────────────────────────────────────────────────

    /// Move the door.  Queues behind any transition already running.
    ///
    /// A schedule-triggered move re-reads the status under the lock and
    /// is skipped if the door already reached the target meanwhile.
    pub async fn actuate(&self, action: DoorAction, trigger: Trigger) -> Result<DoorStatus> {
        let mut door = self.door.lock().await;

        let (from, config) = {
            let store = self.store.borrow();
            (store.door_status(), store.door_config())
        };
        if trigger == Trigger::Schedule && from == action.target() {
            info!("Door: already {}, skipping scheduled {:?}", from, action);
            return Ok(from);
        }

        match door.run(action, config.pulse(), &self.clock).await {
            Ok(to) => {
                if let Err(e) = self.store.borrow_mut().save_door_status(to) {
                    warn!("Door: status {} not persisted: {}", to, e);
                }
                self.state.set(Flag::DisplayUpdated, true);
                self.emit(&AppEvent::DoorMoved { from, to, trigger });
                Ok(to)
            }
            Err(error) => {
                warn!("Door: {:?} failed: {}", action, error);
                self.emit(&AppEvent::DoorFault { trigger, error });
                Err(error.into())
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command from the setup page.
    pub async fn handle_command(&self, cmd: AppCommand) -> Result<CommandReply> {
        match cmd {
            AppCommand::SaveLocation(location) => {
                {
                    let mut store = self.store.borrow_mut();
                    store.save_location(&location)?;
                    if let Err(e) = store.clear_sun_schedule() {
                        warn!("Schedule: stale cache not cleared: {}", e);
                    }
                }
                self.state.set(Flag::DisplayUpdated, true);
                info!("Config: location saved ({})", location.timezone);
                let saved = self.location_view().unwrap_or_else(|| location.clamped());
                Ok(CommandReply::Location(saved))
            }
            AppCommand::SaveNetwork(update) => {
                let ap_request = update.can_start_ap;
                let merged = self.store.borrow_mut().save_network(update)?;
                self.connect_station(&merged, true);
                match ap_request {
                    Some(true) => {
                        self.start_access_point();
                    }
                    Some(false) => self.stop_access_point(),
                    None => {}
                }
                self.state.set(Flag::DisplayUpdated, true);
                Ok(CommandReply::Network(self.network_view()))
            }
            AppCommand::SaveDoorConfig(config) => {
                self.store.borrow_mut().save_door_config(&config)?;
                info!("Config: door duration {}s", config.duration);
                Ok(CommandReply::Door(self.door_view()))
            }
            AppCommand::SetDoorStatus(status) => {
                // Serialise with any running transition.
                let _door = self.door.lock().await;
                self.store.borrow_mut().save_door_status(status)?;
                self.state.set(Flag::DisplayUpdated, true);
                info!("Door: status set to {} by operator", status);
                Ok(CommandReply::Door(self.door_view()))
            }
            AppCommand::Door(action) => {
                self.actuate(action, Trigger::Operator).await?;
                Ok(CommandReply::Door(self.door_view()))
            }
        }
    }

    // ── Views ─────────────────────────────────────────────────

    pub fn location_view(&self) -> Option<Location> {
        self.store.borrow().location()
    }

    pub fn network_view(&self) -> NetworkView {
        let network = self.store.borrow().network().unwrap_or_default();
        NetworkView {
            can_start_ap: network.allows_ap(),
            essid: network.essid,
            ip_address: self.net.borrow().station_ip(),
        }
    }

    pub fn door_view(&self) -> DoorView {
        let store = self.store.borrow();
        DoorView {
            duration: store.door_config().duration,
            status: store.door_status(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn local_now(&self, location: Option<&Location>) -> DateTime {
        let utc = self.clock.now();
        location.map_or(utc, |l| utc.in_timezone(&l.timezone))
    }

    fn screen(&self) -> Screen {
        let store = self.store.borrow();
        let net = self.net.borrow();
        if !store.has_config() {
            return Screen::Setup {
                ap_essid: self.config.access_point.essid.clone(),
                ap_ip: net.ap_ip(),
            };
        }
        let now = self.local_now(store.location().as_ref());
        Screen::Status {
            connected: net.is_connected(),
            station_ip: net.station_ip(),
            schedule: store.sun_schedule(&now.date()),
            door: store.door_status(),
            now,
        }
    }

    fn draw(&self, frame: &Frame) {
        let mut display = self.display.borrow_mut();
        display.clear();
        for line in frame {
            display.text(&line.text, line.x, line.y);
        }
        display.commit();
    }

    fn emit(&self, event: &AppEvent) {
        self.sink.borrow_mut().emit(event);
    }

    /// Best-effort policy: log, count, emit, carry on.
    fn network_failed(&self, error: NetworkError) {
        let total = self.state.note_network_failure();
        warn!("WiFi: {} (failure #{})", error, total);
        self.emit(&AppEvent::NetworkFailure { error, total });
    }

    fn start_access_point(&self) -> bool {
        let ap = &self.config.access_point;
        let result = self.net.borrow_mut().start_ap(&ap.essid, &ap.password);
        match result {
            Ok(()) => true,
            Err(e) => {
                self.network_failed(e);
                false
            }
        }
    }

    fn stop_access_point(&self) {
        let result = self.net.borrow_mut().stop_ap();
        if let Err(e) = result {
            self.network_failed(e);
        }
    }

    /// Join the configured network.  Without `force`, an existing
    /// connection is kept as-is.
    fn connect_station(&self, network: &NetworkConfig, force: bool) {
        let Some((essid, password)) = network.credentials() else {
            debug!("WiFi: no station credentials");
            return;
        };
        if !force && self.net.borrow().is_connected() {
            return;
        }
        let result = self.net.borrow_mut().connect(essid, password);
        if let Err(e) = result {
            self.network_failed(e);
        }
    }
}
