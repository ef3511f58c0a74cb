//! Hardware adapter: bridges the relay drivers to [`ActuatorPort`].
//!
//! Owns both door relays.  This is the only module in the system that
//! touches the relay outputs, and it refuses to energise one relay while
//! the other is held, so the motor can never be driven both ways at once.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{ActuatorPort, DoorOutput};
use crate::drivers::relay::RelayDriver;
use crate::error::ActuatorError;

/// Concrete adapter over the two door relays.
pub struct HardwareAdapter<O: OutputPin, C: OutputPin> {
    open: RelayDriver<O>,
    close: RelayDriver<C>,
}

impl<O: OutputPin, C: OutputPin> HardwareAdapter<O, C> {
    pub fn new(open_pin: O, close_pin: C) -> Self {
        Self {
            open: RelayDriver::new(open_pin, "open"),
            close: RelayDriver::new(close_pin, "close"),
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<O: OutputPin, C: OutputPin> ActuatorPort for HardwareAdapter<O, C> {
    fn energize(&mut self, output: DoorOutput) -> Result<(), ActuatorError> {
        if self.is_energized(output.other()) {
            warn!("Hardware: refusing {:?} relay, {:?} relay is held", output, output.other());
            return Err(ActuatorError::InterlockEngaged);
        }
        match output {
            DoorOutput::Open => self.open.on(),
            DoorOutput::Close => self.close.on(),
        }
    }

    fn release(&mut self, output: DoorOutput) -> Result<(), ActuatorError> {
        match output {
            DoorOutput::Open => self.open.off(),
            DoorOutput::Close => self.close.off(),
        }
    }

    fn release_all(&mut self) {
        if self.open.off().is_err() {
            warn!("Hardware: open relay release failed");
        }
        if self.close.off().is_err() {
            warn!("Hardware: close relay release failed");
        }
    }

    fn is_energized(&self, output: DoorOutput) -> bool {
        match output {
            DoorOutput::Open => self.open.is_on(),
            DoorOutput::Close => self.close.is_on(),
        }
    }
}
