//! System and user configuration.
//!
//! [`SystemConfig`] holds build-time tunables (task cadence, setup access
//! point).  The remaining types are the records an operator edits over the
//! setup page and that [`DataStore`](crate::app::store::DataStore)
//! persists: [`Location`], [`NetworkConfig`] and [`DoorConfig`].

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::calendar::Timezone;

// ───────────────────────────────────────────────────────────────
// System configuration
// ───────────────────────────────────────────────────────────────

/// Loop cadence for the four background tasks, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTiming {
    /// Time-sync period after a successful sync.
    pub time_sync_secs: u32,
    /// Time-sync retry while offline or after a failed sync.
    pub time_sync_retry_secs: u32,
    /// Schedule recomputation check.
    pub schedule_secs: u32,
    /// Schedule retry while the clock or location is missing.
    pub schedule_retry_secs: u32,
    /// Door check period.
    pub door_check_secs: u32,
    /// Door check retry while the clock or location is missing.
    pub door_check_retry_secs: u32,
    /// Display poll period.
    pub display_secs: u32,
}

impl Default for TaskTiming {
    fn default() -> Self {
        Self {
            time_sync_secs: 3600,
            time_sync_retry_secs: 1,
            schedule_secs: 3600,
            schedule_retry_secs: 5,
            door_check_secs: 300,
            door_check_retry_secs: 5,
            display_secs: 1,
        }
    }
}

/// Credentials of the setup access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    pub essid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        let mut essid = heapless::String::new();
        let mut password = heapless::String::new();
        // Both literals fit their capacity.
        let _ = essid.push_str("DawnDoor");
        let _ = password.push_str("dawndoor");
        Self { essid, password }
    }
}

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub timing: TaskTiming,
    pub access_point: AccessPointConfig,
}

// ───────────────────────────────────────────────────────────────
// Location
// ───────────────────────────────────────────────────────────────

/// Where the coop is.  Coordinates are clamped, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// One of the [`Timezone`] codes (`"EST"`, …).
    pub timezone: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: &str) -> Self {
        Self {
            latitude,
            longitude,
            timezone: timezone.to_owned(),
        }
        .clamped()
    }

    pub fn clamped(mut self) -> Self {
        self.latitude = self.latitude.clamp(-90.0, 90.0);
        self.longitude = self.longitude.clamp(-180.0, 180.0);
        self
    }

    pub fn zone(&self) -> Option<Timezone> {
        Timezone::from_code(&self.timezone)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latitude.is_nan() || self.longitude.is_nan() {
            return Err(ConfigError::ValidationFailed("coordinates must be numbers"));
        }
        if self.timezone.is_empty() || self.timezone.len() > 8 {
            return Err(ConfigError::ValidationFailed("timezone must be 1-8 characters"));
        }
        if self.zone().is_none() {
            log::warn!("Config: unknown timezone '{}', using UTC offset 0", self.timezone);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Network
// ───────────────────────────────────────────────────────────────

/// Station credentials plus the access-point policy.  Every field is
/// optional so partial updates can be merged into the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_start_ap: Option<bool>,
}

impl NetworkConfig {
    /// Overlay the fields present in `update`.
    pub fn merge(&mut self, update: NetworkConfig) {
        if update.essid.is_some() {
            self.essid = update.essid;
        }
        if update.password.is_some() {
            self.password = update.password;
        }
        if update.can_start_ap.is_some() {
            self.can_start_ap = update.can_start_ap;
        }
    }

    /// The setup AP may run unless explicitly disabled.
    pub fn allows_ap(&self) -> bool {
        self.can_start_ap.unwrap_or(true)
    }

    /// Station credentials, when an ESSID is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let essid = self.essid.as_deref()?;
        Some((essid, self.password.as_deref().unwrap_or("")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(essid) = &self.essid {
            validate_essid(essid)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// 1-32 printable ASCII bytes.
pub fn validate_essid(essid: &str) -> Result<(), ConfigError> {
    if essid.is_empty() || essid.len() > 32 || !is_printable_ascii(essid) {
        return Err(ConfigError::ValidationFailed("essid must be 1-32 printable ASCII bytes"));
    }
    Ok(())
}

/// Empty (open network), an 8-63 byte WPA2 passphrase, or a 64-digit
/// hex PSK.
pub fn validate_password(password: &str) -> Result<(), ConfigError> {
    let ok = match password.len() {
        0 | 8..=63 => true,
        64 => password.bytes().all(|b| b.is_ascii_hexdigit()),
        _ => false,
    };
    if !ok {
        return Err(ConfigError::ValidationFailed(
            "password must be empty, 8-63 bytes or a 64-digit hex key",
        ));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Door
// ───────────────────────────────────────────────────────────────

pub const DEFAULT_DOOR_DURATION_SECS: u16 = 10;
pub const MAX_DOOR_DURATION_SECS: u16 = 300;

/// How long a relay is held to move the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConfig {
    #[serde(default = "default_duration")]
    pub duration: u16,
}

fn default_duration() -> u16 {
    DEFAULT_DOOR_DURATION_SECS
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DOOR_DURATION_SECS,
        }
    }
}

impl DoorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration == 0 || self.duration > MAX_DOOR_DURATION_SECS {
            return Err(ConfigError::ValidationFailed("door duration must be 1-300 s"));
        }
        Ok(())
    }

    pub fn pulse(&self) -> core::time::Duration {
        core::time::Duration::from_secs(u64::from(self.duration))
    }
}
