//! Fuzz target: persisted record decoder
//!
//! Feeds arbitrary bytes to `decode_record` for every record type the
//! store keeps and verifies:
//! - No panics under arbitrary byte inputs
//! - A decoded location is accepted by `DataStore` after clamping
//! - A decoded schedule entry never yields an invalid date/time
//!
//! cargo fuzz run fuzz_store_decode

#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;

use dawndoor::app::store::decode_record;
use dawndoor::calendar::SparseDateTime;
use dawndoor::config::{DoorConfig, Location, NetworkConfig};
use dawndoor::door::DoorStatus;

#[derive(serde::Deserialize)]
struct Entry {
    sunrise: SparseDateTime,
    sunset: SparseDateTime,
}

fuzz_target!(|data: &[u8]| {
    if let Ok(location) = decode_record::<Location>(data) {
        let clamped = location.clamped();
        if !clamped.latitude.is_nan() {
            assert!((-90.0..=90.0).contains(&clamped.latitude));
        }
        if !clamped.longitude.is_nan() {
            assert!((-180.0..=180.0).contains(&clamped.longitude));
        }
    }

    let _ = decode_record::<NetworkConfig>(data);
    let _ = decode_record::<DoorStatus>(data);

    if let Ok(config) = decode_record::<DoorConfig>(data) {
        if config.validate().is_ok() {
            assert!(config.duration >= 1 && config.duration <= 300);
        }
    }

    if let Ok(schedule) = decode_record::<BTreeMap<String, Entry>>(data) {
        for entry in schedule.values() {
            for sparse in [entry.sunrise, entry.sunset] {
                if let Some(dt) = sparse.to_date_time() {
                    assert!(dt.hour() < 24 && dt.minute() < 60);
                }
            }
        }
    }
});
