//! DawnDoor Firmware: Main Entry Point
//!
//! Opens the coop door at sunrise and closes it at sunset.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   SystemClock     │
//! │  (door relays)     (EventSink)    (Storage)    (ClockPort)     │
//! │  WifiAdapter       LogDisplay                                  │
//! │  (STA + AP)        (DisplayPort)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  solar · door schedule · schedule cache · display      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Supervisor: time sync · schedule · door check · display       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use dawndoor::adapters::display::LogDisplay;
use dawndoor::adapters::hardware::HardwareAdapter;
use dawndoor::adapters::log_sink::LogEventSink;
use dawndoor::adapters::nvs::NvsAdapter;
use dawndoor::adapters::time::SystemClock;
use dawndoor::adapters::wifi::WifiAdapter;
use dawndoor::app::service::AppService;
use dawndoor::config::SystemConfig;
use dawndoor::scheduler;

fn main() -> Result<()> {
    // ── 1. Bootstrap logging ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  DawnDoor v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    let (actuator, wifi) = {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_hal::gpio::PinDriver;
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;

        let peripherals = Peripherals::take()?;
        // Pin numbers must match `pins::DOOR_OPEN_RELAY_GPIO` / `DOOR_CLOSE_RELAY_GPIO`.
        let open = PinDriver::output(peripherals.pins.gpio5)?;
        let close = PinDriver::output(peripherals.pins.gpio4)?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;
        let wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs_partition)
            .map_err(|e| anyhow::anyhow!("WiFi init failed: {}", e))?;
        (HardwareAdapter::new(open, close), wifi)
    };

    #[cfg(not(target_os = "espidf"))]
    let (actuator, wifi) = {
        use dawndoor::drivers::relay::SimOutputPin;
        (HardwareAdapter::new(SimOutputPin::new(), SimOutputPin::new()), WifiAdapter::new())
    };

    // ── 3. Storage ────────────────────────────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            // Without NVS nothing can be configured; that is fatal.
            warn!("NVS init failed ({})", e);
            return Err(anyhow::anyhow!("storage unavailable: {}", e));
        }
    };

    // ── 4. Service + boot ─────────────────────────────────────
    let svc = AppService::new(
        SystemConfig::default(),
        nvs,
        SystemClock::new(),
        wifi,
        LogDisplay::new(),
        actuator,
        LogEventSink::new(),
    );
    svc.boot();

    // ── 5. Supervise the tasks forever ────────────────────────
    scheduler::run(&svc, core::future::pending());

    info!("DawnDoor: supervisor returned");
    Ok(())
}
