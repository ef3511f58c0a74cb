//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (relays, WiFi, clock, display, storage, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Security notes
//!
//! - Config writes are validated in [`DataStore`](super::store::DataStore)
//!   before they reach a [`StoragePort`].
//! - All port errors are typed; callers must handle every variant explicitly.

use core::future::Future;
use core::net::Ipv4Addr;
use core::time::Duration;

use crate::calendar::DateTime;
use crate::error::ActuatorError;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → relays)
// ───────────────────────────────────────────────────────────────

/// The two relay outputs driving the door motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorOutput {
    Open,
    Close,
}

impl DoorOutput {
    pub const fn other(self) -> Self {
        match self {
            Self::Open => Self::Close,
            Self::Close => Self::Open,
        }
    }
}

/// Write-side port: the domain calls this to drive the door relays.
pub trait ActuatorPort {
    /// Energise one output.  Fails if the other one is still energised.
    fn energize(&mut self, output: DoorOutput) -> Result<(), ActuatorError>;

    /// De-energise one output.
    fn release(&mut self, output: DoorOutput) -> Result<(), ActuatorError>;

    /// De-energise both outputs, ignoring errors (safe shutdown).
    fn release_all(&mut self);

    fn is_energized(&self, output: DoorOutput) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC / SNTP / timers)
// ───────────────────────────────────────────────────────────────

/// Wall clock, network time and the one suspension primitive the core uses.
pub trait ClockPort {
    /// Current UTC date/time with weekday and ordinal populated.
    fn now(&self) -> DateTime;

    /// Set the clock from network time.
    fn sync_time(&self) -> Result<(), ClockError>;

    /// Suspend the calling task.  Other tasks keep running meanwhile.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: WiFi station + access point)
// ───────────────────────────────────────────────────────────────

pub trait NetworkPort {
    /// Join an access point as a station.
    fn connect(&mut self, essid: &str, password: &str) -> Result<(), NetworkError>;

    /// Bring up the setup access point.
    fn start_ap(&mut self, essid: &str, password: &str) -> Result<(), NetworkError>;

    fn stop_ap(&mut self) -> Result<(), NetworkError>;

    fn is_connected(&self) -> bool;

    /// Station address, when connected.
    fn station_ip(&self) -> Option<Ipv4Addr>;

    /// Access-point address, when the AP is up.
    fn ap_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: 128×64 monochrome panel)
// ───────────────────────────────────────────────────────────────

/// Text-only drawing surface.  Coordinates are pixels from the top-left.
pub trait DisplayPort {
    fn clear(&mut self);

    fn text(&mut self, line: &str, x: u8, y: u8);

    /// Push the buffered frame to the panel.
    fn commit(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// # Security
///
/// - Implementations SHOULD encrypt sensitive keys (WiFi passwords).
///   On ESP32, prefer the encrypted NVS partition for these.
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored record failed deserialization or carries an unknown version.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Value does not fit the caller's buffer.
    BufferTooSmall,
    /// Record could not be encoded.
    Encode,
}

/// Errors from [`NetworkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// SSID empty or longer than 32 bytes.
    InvalidSsid,
    /// Password shorter than 8 or longer than 64 bytes.
    InvalidPassword,
    /// No network configuration stored.
    NotConfigured,
    /// Association or DHCP failed.
    ConnectFailed,
    /// Access point could not be started or stopped.
    AccessPointFailed,
    /// Driver-level failure.
    HardwareError,
}

/// Errors from [`ClockPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// SNTP did not complete in time.
    SyncTimeout,
    /// SNTP completed but the clock reads before 2020.
    Implausible,
    /// SNTP service could not be started.
    Unavailable,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::NotConfigured => write!(f, "no network configured"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::AccessPointFailed => write!(f, "access point failed"),
            Self::HardwareError => write!(f, "WiFi hardware error"),
        }
    }
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SyncTimeout => write!(f, "time sync timed out"),
            Self::Implausible => write!(f, "clock not plausible after sync"),
            Self::Unavailable => write!(f, "SNTP unavailable"),
        }
    }
}
