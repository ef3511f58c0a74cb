//! Output drivers for the door hardware.

pub mod relay;
