//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                  |
//! |------------|----------------|------------------------------|
//! | `display`  | DisplayPort    | 128×64 panel / serial mirror |
//! | `hardware` | ActuatorPort   | door relays via GPIO         |
//! | `log_sink` | EventSink      | Serial log output            |
//! | `nvs`      | StoragePort    | NVS / in-memory store        |
//! | `time`     | ClockPort      | RTC + SNTP, reactor timer    |
//! | `wifi`     | NetworkPort    | ESP-IDF WiFi STA + AP        |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
