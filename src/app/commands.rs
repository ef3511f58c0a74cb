//! Inbound commands to the application service.
//!
//! These are what the setup web page asks for.  The
//! [`AppService`](super::service::AppService) validates, persists and
//! acts on them, answering with a [`CommandReply`].

use core::net::Ipv4Addr;

use serde::Serialize;

use crate::config::{DoorConfig, Location, NetworkConfig};
use crate::door::{DoorAction, DoorStatus};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Store latitude, longitude and timezone.
    SaveLocation(Location),

    /// Merge WiFi settings, reconnect, and apply the AP policy if given.
    SaveNetwork(NetworkConfig),

    /// Store the relay pulse length.
    SaveDoorConfig(DoorConfig),

    /// Correct the recorded door status without moving the door.
    SetDoorStatus(DoorStatus),

    /// Move the door now, ignoring the schedule.
    Door(DoorAction),
}

/// What the network settings page shows.  Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkView {
    pub essid: Option<String>,
    pub can_start_ap: bool,
    pub ip_address: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorView {
    pub duration: u16,
    pub status: DoorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Location(Location),
    Network(NetworkView),
    Door(DoorView),
}
