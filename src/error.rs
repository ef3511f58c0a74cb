//! Unified error type for the DawnDoor firmware.
//!
//! Every port error converts into [`Error`], so command handlers and the
//! bootstrap path handle failures uniformly.  All variants are `Copy`.

use core::fmt;

use crate::app::ports::{ClockError, ConfigError, NetworkError, StorageError};
use crate::solar::SolarError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage failed.
    Storage(StorageError),
    /// WiFi station / access point failure.
    Network(NetworkError),
    /// Wall clock or network time failure.
    Clock(ClockError),
    /// A relay output could not be driven.
    Actuator(ActuatorError),
    /// A configuration value was rejected.
    Config(ConfigError),
    /// No sunrise/sunset for the requested place and date.
    Solar(SolarError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Solar(e) => write!(f, "solar: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SolarError> for Error {
    fn from(e: SolarError) -> Self {
        Self::Solar(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// The opposite relay is still energised.
    InterlockEngaged,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::InterlockEngaged => write!(f, "opposite relay energised"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
