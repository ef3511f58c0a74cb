//! Typed records over a [`StoragePort`].
//!
//! Every record is JSON wrapped in a versioned envelope:
//!
//! ```json
//! {"v": 1, "data": {"latitude": 40.7, "longitude": -74.0, "timezone": "EST"}}
//! ```
//!
//! | key              | record                                             |
//! |------------------|----------------------------------------------------|
//! | `location`       | [`Location`]                                       |
//! | `network`        | [`NetworkConfig`] (merged on save)                 |
//! | `door_status`    | [`DoorStatus`] (`"Open"` / `"Closed"`)             |
//! | `door_config`    | [`DoorConfig`]                                     |
//! | `sunrise_sunset` | `{"YYYY-MM-DD": {"sunrise": {…}, "sunset": {…}}}`  |
//!
//! Reads never fail: a missing key, an I/O error, a corrupt blob or an
//! unknown envelope version all read as "absent" (with a warning for
//! anything other than a missing key).  Writes validate first.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::calendar::{Date, SparseDateTime};
use crate::config::{DoorConfig, Location, NetworkConfig};
use crate::door::DoorStatus;
use crate::error::Result;
use crate::solar::SunSchedule;

use super::ports::{ConfigError, StorageError, StoragePort};

pub const NAMESPACE: &str = "dawndoor";
pub const RECORD_VERSION: u8 = 1;

/// Largest record the store will read back.
const RECORD_BUF_LEN: usize = 512;

pub const KEY_LOCATION: &str = "location";
pub const KEY_NETWORK: &str = "network";
pub const KEY_DOOR_STATUS: &str = "door_status";
pub const KEY_DOOR_CONFIG: &str = "door_config";
pub const KEY_SUN_SCHEDULE: &str = "sunrise_sunset";

const ALL_KEYS: [&str; 5] = [
    KEY_LOCATION,
    KEY_NETWORK,
    KEY_DOOR_STATUS,
    KEY_DOOR_CONFIG,
    KEY_SUN_SCHEDULE,
];

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u8,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    v: u8,
    data: T,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct StoredSunTimes {
    sunrise: SparseDateTime,
    sunset: SparseDateTime,
}

/// Single-slot schedule cache, keyed by date.
type ScheduleRecord = BTreeMap<String, StoredSunTimes>;

/// Encode `data` in the current envelope.
pub fn encode_record<T: Serialize>(data: &T) -> core::result::Result<Vec<u8>, StorageError> {
    serde_json::to_vec(&EnvelopeRef {
        v: RECORD_VERSION,
        data,
    })
    .map_err(|_| StorageError::Encode)
}

/// Decode an enveloped record.  Unknown versions are rejected.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> core::result::Result<T, ConfigError> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
    if envelope.v != RECORD_VERSION {
        return Err(ConfigError::Corrupted);
    }
    Ok(envelope.data)
}

pub struct DataStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> DataStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ── Generic record access ─────────────────────────────────

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut buf = [0u8; RECORD_BUF_LEN];
        let len = match self.storage.read(NAMESPACE, key, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return None,
            Err(e) => {
                warn!("Store: read '{}' failed: {}", key, e);
                return None;
            }
        };
        match decode_record(&buf[..len]) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Store: '{}' unreadable ({}), treating as absent", key, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let bytes = encode_record(value)?;
        if bytes.len() > RECORD_BUF_LEN {
            return Err(StorageError::Full.into());
        }
        self.storage.write(NAMESPACE, key, &bytes)?;
        debug!("Store: wrote '{}' ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// True once anything at all has been saved.
    pub fn has_config(&self) -> bool {
        ALL_KEYS.iter().any(|key| self.storage.exists(NAMESPACE, key))
    }

    // ── Location ──────────────────────────────────────────────

    pub fn location(&self) -> Option<Location> {
        self.load::<Location>(KEY_LOCATION).map(Location::clamped)
    }

    pub fn save_location(&mut self, location: &Location) -> Result<()> {
        let location = location.clone().clamped();
        location.validate()?;
        self.store(KEY_LOCATION, &location)
    }

    // ── Network ───────────────────────────────────────────────

    pub fn network(&self) -> Option<NetworkConfig> {
        self.load(KEY_NETWORK)
    }

    /// Merge `update` into the stored record; returns the merged record.
    pub fn save_network(&mut self, update: NetworkConfig) -> Result<NetworkConfig> {
        update.validate()?;
        let mut merged = self.network().unwrap_or_default();
        merged.merge(update);
        self.store(KEY_NETWORK, &merged)?;
        Ok(merged)
    }

    // ── Door ──────────────────────────────────────────────────

    /// Last persisted door status; `Closed` if never set.
    pub fn door_status(&self) -> DoorStatus {
        self.load(KEY_DOOR_STATUS).unwrap_or_default()
    }

    pub fn save_door_status(&mut self, status: DoorStatus) -> Result<()> {
        self.store(KEY_DOOR_STATUS, &status)
    }

    pub fn door_config(&self) -> DoorConfig {
        match self.load::<DoorConfig>(KEY_DOOR_CONFIG) {
            Some(cfg) if cfg.validate().is_ok() => cfg,
            Some(cfg) => {
                warn!("Store: stored door duration {}s out of range, using default", cfg.duration);
                DoorConfig::default()
            }
            None => DoorConfig::default(),
        }
    }

    pub fn save_door_config(&mut self, config: &DoorConfig) -> Result<()> {
        config.validate()?;
        self.store(KEY_DOOR_CONFIG, config)
    }

    // ── Sunrise / sunset cache ────────────────────────────────

    /// Cached schedule for `date`, if the single slot holds that date.
    pub fn sun_schedule(&self, date: &Date) -> Option<SunSchedule> {
        let record: ScheduleRecord = self.load(KEY_SUN_SCHEDULE)?;
        let entry = record.get(&date.to_string())?;
        match (entry.sunrise.to_date_time(), entry.sunset.to_date_time()) {
            (Some(sunrise), Some(sunset)) => Some(SunSchedule { sunrise, sunset }),
            _ => {
                warn!("Store: cached schedule for {} is incomplete", date);
                None
            }
        }
    }

    /// Replace the cache with `schedule`.
    pub fn save_sun_schedule(&mut self, schedule: &SunSchedule) -> Result<()> {
        let mut record = ScheduleRecord::new();
        record.insert(
            schedule.date().to_string(),
            StoredSunTimes {
                sunrise: schedule.sunrise.to_sparse_map(),
                sunset: schedule.sunset.to_sparse_map(),
            },
        );
        self.store(KEY_SUN_SCHEDULE, &record)
    }

    /// Drop the cached schedule (location changed).
    pub fn clear_sun_schedule(&mut self) -> Result<()> {
        self.storage.delete(NAMESPACE, KEY_SUN_SCHEDULE)?;
        Ok(())
    }
}
