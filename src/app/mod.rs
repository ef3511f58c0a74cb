//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the DawnDoor system:
//! time sync, sunrise/sunset caching, the door schedule and the display.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod frame;
pub mod ports;
pub mod service;
pub mod state;
pub mod store;
