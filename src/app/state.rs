//! Process-lifetime flags shared by the background tasks.
//!
//! Tasks poll these; nothing ever blocks on a flag.  Backed by atomics so
//! a read is never torn, even if the tasks are later moved onto threads.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Boot sequence finished.
    Ready,
    /// Something on screen is stale.
    DisplayUpdated,
    /// The clock has been set from network time.
    TimeSet,
}

#[derive(Debug, Default)]
pub struct SharedState {
    ready: AtomicBool,
    display_updated: AtomicBool,
    time_set: AtomicBool,
    network_failures: AtomicU32,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            display_updated: AtomicBool::new(false),
            time_set: AtomicBool::new(false),
            network_failures: AtomicU32::new(0),
        }
    }

    fn slot(&self, flag: Flag) -> &AtomicBool {
        match flag {
            Flag::Ready => &self.ready,
            Flag::DisplayUpdated => &self.display_updated,
            Flag::TimeSet => &self.time_set,
        }
    }

    pub fn get(&self, flag: Flag) -> bool {
        self.slot(flag).load(Ordering::Acquire)
    }

    pub fn set(&self, flag: Flag, value: bool) {
        self.slot(flag).store(value, Ordering::Release);
    }

    /// Record a swallowed network error.  Returns the new total.
    pub fn note_network_failure(&self) -> u32 {
        self.network_failures.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn network_failures(&self) -> u32 {
        self.network_failures.load(Ordering::Relaxed)
    }
}
