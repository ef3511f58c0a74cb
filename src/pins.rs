//! GPIO / peripheral pin assignments for the DawnDoor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Door motor relays
// ---------------------------------------------------------------------------

/// Relay that drives the door motor in the opening direction (active HIGH).
pub const DOOR_OPEN_RELAY_GPIO: i32 = 5;
/// Relay that drives the door motor in the closing direction (active HIGH).
/// Never energised together with [`DOOR_OPEN_RELAY_GPIO`].
pub const DOOR_CLOSE_RELAY_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Display (log-mirrored; no panel driver is wired up)
// ---------------------------------------------------------------------------

pub const DISPLAY_WIDTH: u8 = 128;
pub const DISPLAY_HEIGHT: u8 = 64;
