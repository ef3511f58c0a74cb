//! Door motor relay driver.
//!
//! One relay per direction; the motor runs while its relay is held.
//! Generic over an `embedded-hal` [`OutputPin`] so the same driver runs
//! on an ESP-IDF `PinDriver` or on [`SimOutputPin`] in host builds.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  Mutual exclusion of the two relays is
//! enforced one level up in the hardware adapter.

use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, warn};

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    state: RelayState,
    label: &'static str,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the pin and drive it low.
    pub fn new(pin: P, label: &'static str) -> Self {
        let mut relay = Self {
            pin,
            state: RelayState::On,
            label,
        };
        if relay.off().is_err() {
            warn!("Relay[{}]: could not drive low at init", label);
        }
        relay
    }

    pub fn on(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = RelayState::On;
        debug!("Relay[{}]: on", self.label);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = RelayState::Off;
        debug!("Relay[{}]: off", self.label);
        Ok(())
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == RelayState::On
    }
}

/// In-memory output pin for host builds.
#[derive(Debug, Default)]
pub struct SimOutputPin {
    high: bool,
}

impl SimOutputPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimOutputPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
