//! What goes on the 128×64 panel.
//!
//! Rendering is pure: the service gathers a [`Screen`] and [`render`]
//! lays it out as positioned text lines (8 px font, 16 columns).
//!
//! ```text
//!  setup               status
//!  ┌────────────────┐  ┌────────────────┐
//!  │To set up:      │  │DawnDoor        │
//!  │WiFi: DawnDoor  │  │                │
//!  │Browser:        │  │Connected       │
//!  │ 192.168.4.1    │  │192.168.1.50    │
//!  │                │  │                │
//!  │                │  │06:03      18:14│
//!  │                │  │Closed     21:07│
//!  └────────────────┘  └────────────────┘
//! ```

use core::fmt::Write as _;
use core::net::Ipv4Addr;

use crate::calendar::DateTime;
use crate::door::DoorStatus;
use crate::solar::SunSchedule;

pub const LINE_CHARS: usize = 16;
pub const MAX_LINES: usize = 8;

/// Right-hand column.
const RIGHT_X: u8 = 88;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: heapless::String<LINE_CHARS>,
    pub x: u8,
    pub y: u8,
}

pub type Frame = heapless::Vec<TextLine, MAX_LINES>;

/// Snapshot of everything the display shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Nothing configured yet: point the user at the setup AP.
    Setup { ap_essid: heapless::String<32>, ap_ip: Option<Ipv4Addr> },
    Status {
        connected: bool,
        station_ip: Option<Ipv4Addr>,
        schedule: Option<SunSchedule>,
        door: DoorStatus,
        now: DateTime,
    },
}

fn push(frame: &mut Frame, x: u8, y: u8, args: core::fmt::Arguments<'_>) {
    let mut full = String::new();
    let _ = full.write_fmt(args);
    let mut text = heapless::String::new();
    for c in full.chars() {
        if text.push(c).is_err() {
            break;
        }
    }
    if frame.push(TextLine { text, x, y }).is_err() {
        log::warn!("Display: frame full, dropping line at y={}", y);
    }
}

fn hhmm(frame: &mut Frame, x: u8, y: u8, dt: &DateTime) {
    push(frame, x, y, format_args!("{:02}:{:02}", dt.hour(), dt.minute()));
}

pub fn render(screen: &Screen) -> Frame {
    let mut frame = Frame::new();
    match screen {
        Screen::Setup { ap_essid, ap_ip } => {
            push(&mut frame, 0, 0, format_args!("To set up:"));
            push(&mut frame, 0, 10, format_args!("WiFi: {}", ap_essid));
            push(&mut frame, 0, 20, format_args!("Browser:"));
            match ap_ip {
                Some(ip) => push(&mut frame, 0, 30, format_args!(" {}", ip)),
                None => push(&mut frame, 0, 30, format_args!(" -")),
            }
        }
        Screen::Status {
            connected,
            station_ip,
            schedule,
            door,
            now,
        } => {
            push(&mut frame, 0, 0, format_args!("DawnDoor"));
            if *connected {
                push(&mut frame, 0, 16, format_args!("Connected"));
                if let Some(ip) = station_ip {
                    push(&mut frame, 0, 26, format_args!("{}", ip));
                }
            } else {
                push(&mut frame, 0, 16, format_args!("Not connected"));
            }
            if let Some(s) = schedule {
                hhmm(&mut frame, 0, 46, &s.sunrise);
                hhmm(&mut frame, RIGHT_X, 46, &s.sunset);
            }
            push(&mut frame, 0, 56, format_args!("{}", door));
            hhmm(&mut frame, RIGHT_X, 56, now);
        }
    }
    frame
}

/// Shown once at power-on.
pub fn splash() -> Frame {
    let mut frame = Frame::new();
    push(&mut frame, 32, 28, format_args!("DawnDoor"));
    frame
}
