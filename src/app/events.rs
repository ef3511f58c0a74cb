//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, show on a status page,
//! etc.

use crate::app::ports::{ClockError, NetworkError};
use crate::calendar::Date;
use crate::door::DoorStatus;
use crate::error::ActuatorError;
use crate::solar::{SolarError, SunSchedule};

/// Who asked for a door movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Sunrise/sunset rule in the door-check task.
    Schedule,
    /// Explicit operator command.
    Operator,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot sequence finished.
    Started { access_point: bool },

    /// Clock set from network time.
    TimeSynced,

    TimeSyncFailed(ClockError),

    /// A new schedule was computed and cached.
    ScheduleComputed(SunSchedule),

    /// No sunrise or sunset exists for this date and place.
    ScheduleUnavailable { date: Date, reason: SolarError },

    /// The door finished a transition.
    DoorMoved { from: DoorStatus, to: DoorStatus, trigger: Trigger },

    /// A door transition failed on the relays.
    DoorFault { trigger: Trigger, error: ActuatorError },

    /// A best-effort network operation failed (running total attached).
    NetworkFailure { error: NetworkError, total: u32 },
}
