//! Coop door state machine.
//!
//! ```text
//!            open()  (open relay, pulse)
//!   Closed ───────────────────────────▶ Open
//!     ▲                                   │
//!     └───────────────────────────────────┘
//!            close() (close relay, pulse)
//! ```
//!
//! [`scheduled_action`] is the pure schedule rule; [`Door`] executes a
//! transition on the relays.  The door has no position sensor, so the
//! persisted [`DoorStatus`] is the only record of where it is.

use core::fmt;
use core::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ActuatorPort, ClockPort, DoorOutput};
use crate::calendar::DateTime;
use crate::error::ActuatorError;
use crate::solar::SunSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoorStatus {
    Open,
    #[default]
    Closed,
}

impl DoorStatus {
    pub const fn invert(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorAction {
    Open,
    Close,
}

impl DoorAction {
    /// Status after the action completes.
    pub const fn target(self) -> DoorStatus {
        match self {
            Self::Open => DoorStatus::Open,
            Self::Close => DoorStatus::Closed,
        }
    }

    pub const fn output(self) -> DoorOutput {
        match self {
            Self::Open => DoorOutput::Open,
            Self::Close => DoorOutput::Close,
        }
    }
}

/// What the schedule wants done right now, if anything.
///
/// Closed and strictly between sunrise and sunset: open.  Open and
/// strictly after sunset: close.  Before sunrise an open door stays open.
pub fn scheduled_action(status: DoorStatus, now: &DateTime, schedule: &SunSchedule) -> Option<DoorAction> {
    match status {
        DoorStatus::Closed if now.follows(&schedule.sunrise) && now.precedes(&schedule.sunset) => {
            Some(DoorAction::Open)
        }
        DoorStatus::Open if now.follows(&schedule.sunset) => Some(DoorAction::Close),
        _ => None,
    }
}

/// Drives the two door relays.  Both are released on drop.
pub struct Door<A: ActuatorPort> {
    actuator: A,
}

impl<A: ActuatorPort> Door<A> {
    pub fn new(mut actuator: A) -> Self {
        actuator.release_all();
        Self { actuator }
    }

    /// Energise the action's relay for `pulse`, then release it.
    ///
    /// The pulse is a timer suspension; other tasks run meanwhile.
    /// Returns the status the door is now in.
    pub async fn run<C: ClockPort>(
        &mut self,
        action: DoorAction,
        pulse: Duration,
        clock: &C,
    ) -> Result<DoorStatus, ActuatorError> {
        let output = action.output();
        info!("Door: {:?} ({:?} relay, {}s pulse)", action, output, pulse.as_secs());
        self.actuator.energize(output)?;

        clock.sleep(pulse).await;

        if let Err(e) = self.actuator.release(output) {
            warn!("Door: release of {:?} relay failed ({}), forcing all off", output, e);
            self.actuator.release_all();
            return Err(e);
        }
        Ok(action.target())
    }

    pub async fn open<C: ClockPort>(&mut self, pulse: Duration, clock: &C) -> Result<DoorStatus, ActuatorError> {
        self.run(DoorAction::Open, pulse, clock).await
    }

    pub async fn close<C: ClockPort>(&mut self, pulse: Duration, clock: &C) -> Result<DoorStatus, ActuatorError> {
        self.run(DoorAction::Close, pulse, clock).await
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

impl<A: ActuatorPort> Drop for Door<A> {
    fn drop(&mut self) {
        self.actuator.release_all();
    }
}
