//! Display adapter.
//!
//! Implements [`DisplayPort`] for a 128×64 text panel.  Lines are
//! buffered between `clear` and `commit`; a commit pushes the whole
//! frame at once.  This backend mirrors each committed frame to the
//! logger so the screen can be followed on the serial console.

use log::{debug, info};

use crate::app::frame::{Frame, TextLine};
use crate::app::ports::DisplayPort;
use crate::pins::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

#[derive(Default)]
pub struct LogDisplay {
    pending: Frame,
    shown: Frame,
    commits: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        info!("Display: {}x{} log-mirrored panel", DISPLAY_WIDTH, DISPLAY_HEIGHT);
        Self::default()
    }

    /// The frame most recently committed to the panel.
    pub fn last_frame(&self) -> &Frame {
        &self.shown
    }

    pub fn commit_count(&self) -> u32 {
        self.commits
    }
}

impl DisplayPort for LogDisplay {
    fn clear(&mut self) {
        self.pending.clear();
    }

    fn text(&mut self, line: &str, x: u8, y: u8) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            debug!("Display: '{}' at ({},{}) is off-screen", line, x, y);
            return;
        }
        let mut text = heapless::String::new();
        for ch in line.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }
        // Frame full: later lines are dropped.
        let _ = self.pending.push(TextLine { text, x, y });
    }

    fn commit(&mut self) {
        if self.pending == self.shown {
            return;
        }
        self.shown = self.pending.clone();
        self.commits = self.commits.wrapping_add(1);
        let rendered: Vec<&str> = self.shown.iter().map(|l| l.text.as_str()).collect();
        debug!("Display: [{}]", rendered.join(" | "));
    }
}
