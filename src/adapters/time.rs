//! Wall-clock adapter.
//!
//! Implements [`ClockPort`] for the DawnDoor system.
//!
//! - **`target_os = "espidf"`**: reads the newlib RTC through `chrono`
//!   and sets it with the ESP-IDF SNTP client.
//! - **`not(target_os = "espidf")`**: the host clock is assumed to be
//!   NTP-disciplined already; a sync only checks that it is plausible.
//!
//! Sleeping goes through the `async-io-mini` reactor timer on both.

use core::cell::Cell;
use core::future::Future;
use core::time::Duration;

use log::{info, warn};

use crate::app::ports::{ClockError, ClockPort};
use crate::calendar::DateTime;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

/// Reject obviously unsynced time (before 2020-01-01).
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(target_os = "espidf")]
    sntp: core::cell::RefCell<Option<EspSntp<'static>>>,
    syncs: Cell<u32>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: core::cell::RefCell::new(None),
            syncs: Cell::new(0),
        }
    }

    /// Successful syncs since boot.
    pub fn sync_count(&self) -> u32 {
        self.syncs.get()
    }

    fn plausible(&self) -> bool {
        chrono::Utc::now().timestamp() >= EPOCH_2020
    }

    #[cfg(target_os = "espidf")]
    fn platform_sync(&self) -> Result<(), ClockError> {
        let mut sntp = self.sntp.borrow_mut();
        if sntp.is_none() {
            let client = EspSntp::new_default().map_err(|e| {
                warn!("Clock: SNTP start failed: {}", e);
                ClockError::Unavailable
            })?;
            info!("Clock: SNTP started");
            *sntp = Some(client);
        }
        match sntp.as_ref().map(EspSntp::get_sync_status) {
            Some(SyncStatus::Completed) => Ok(()),
            _ => Err(ClockError::SyncTimeout),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_sync(&self) -> Result<(), ClockError> {
        Ok(())
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime {
        DateTime::from_naive(chrono::Utc::now().naive_utc())
    }

    fn sync_time(&self) -> Result<(), ClockError> {
        self.platform_sync()?;
        if !self.plausible() {
            warn!("Clock: synced but still before 2020");
            return Err(ClockError::Implausible);
        }
        self.syncs.set(self.syncs.get().wrapping_add(1));
        info!("Clock: time is {}", self.now());
        Ok(())
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        async move {
            async_io_mini::Timer::after(duration).await;
        }
    }
}
