//! DawnDoor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calendar;
pub mod config;
pub mod door;
pub mod error;
pub mod scheduler;
pub mod solar;

pub mod pins;

// Adapters and drivers carry both the ESP-IDF and the simulation backends.
pub mod adapters;
pub mod drivers;
