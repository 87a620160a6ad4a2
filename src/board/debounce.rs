//! Trailing-edge debounce for pad triggers
use std::time::{Duration, Instant};

/// Default minimum spacing between triggers.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
struct Pending {
    key: char,
    deadline: Instant,
}

/// Coalesces rapid trigger requests into the last one made within the window.
///
/// Each `submit` cancels whatever was pending and reschedules. Nothing fires
/// on its own; the owner calls `poll` with the current time.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules `key` for `now + window`. Returns true if an earlier pending
    /// key was cancelled.
    pub fn submit(&mut self, key: char, now: Instant) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some(Pending {
            key,
            deadline: now + self.window,
        });
        replaced
    }

    /// Returns the pending key once its deadline has passed, clearing it.
    pub fn poll(&mut self, now: Instant) -> Option<char> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(pending.key)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
