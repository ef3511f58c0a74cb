//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC on the device, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { access_point } => {
                info!("START | access_point={}", if *access_point { "up" } else { "down" });
            }
            AppEvent::TimeSynced => info!("TIME  | synced"),
            AppEvent::TimeSyncFailed(e) => warn!("TIME  | sync failed: {}", e),
            AppEvent::ScheduleComputed(s) => {
                info!(
                    "SUN   | {} sunrise={:02}:{:02} sunset={:02}:{:02}",
                    s.date(),
                    s.sunrise.hour(),
                    s.sunrise.minute(),
                    s.sunset.hour(),
                    s.sunset.minute(),
                );
            }
            AppEvent::ScheduleUnavailable { date, reason } => {
                warn!("SUN   | {} no schedule: {}", date, reason);
            }
            AppEvent::DoorMoved { from, to, trigger } => {
                info!("DOOR  | {} -> {} ({:?})", from, to, trigger);
            }
            AppEvent::DoorFault { trigger, error } => {
                warn!("DOOR  | fault during {:?} move: {}", trigger, error);
            }
            AppEvent::NetworkFailure { error, total } => {
                warn!("NET   | {} (failures={})", error, total);
            }
        }
    }
}
