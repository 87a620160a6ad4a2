//! Keyboard listener - routes physical key presses to pads
use crate::pads::Kit;
use tracing::debug;

/// Filters key presses down to the kit's trigger keys.
///
/// The listener only forwards keys while attached. The app attaches it when
/// the board is shown and detaches it on teardown.
#[derive(Debug, Clone)]
pub struct KeyboardListener {
    kit: Kit,
    attached: bool,
}

impl KeyboardListener {
    pub fn new(kit: Kit) -> Self {
        Self {
            kit,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        if !self.attached {
            debug!("Keyboard listener attached");
            self.attached = true;
        }
    }

    pub fn detach(&mut self) {
        if self.attached {
            debug!("Keyboard listener detached");
            self.attached = false;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Maps a key name (e.g. `"q"` or `"Q"`) to a trigger key.
    pub fn key_pressed(&self, name: &str) -> Option<char> {
        if !self.attached {
            return None;
        }

        let mut chars = name.chars();
        let key = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() {
            return None;
        }

        self.kit.contains(key).then_some(key)
    }
}
