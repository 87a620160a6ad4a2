//! Pad board - trigger handling and the display label
//! This is backend-agnostic: anything implementing `ClipPlayer` can sound the pads.
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::audio::AudioError;
use crate::pads::{Kit, PadDefinition};

pub mod debounce;
pub mod keyboard;

use debounce::Debouncer;

/// Per-pad clip control used by the board.
pub trait ClipPlayer {
    /// Whether a clip exists for this pad. May load it on first call.
    fn has_clip(&mut self, index: usize) -> bool;

    /// Pauses the clip and rewinds it to the start.
    fn stop(&mut self, index: usize);

    /// Moves the clip back to the start without changing play state.
    fn rewind(&mut self, index: usize);

    /// Starts the clip from its current position.
    fn play(&mut self, index: usize) -> Result<(), AudioError>;

    /// Whether the clip is audible right now. Clips end on their own.
    fn is_playing(&self, index: usize) -> bool;
}

pub struct PadBoard<P: ClipPlayer> {
    kit: Kit,
    player: P,
    /// The one pad flagged as playing, if any.
    active: Option<usize>,
    display: String,
    debouncer: Debouncer,
}

impl<P: ClipPlayer> PadBoard<P> {
    pub fn new(kit: Kit, player: P, debounce_window: Duration) -> Self {
        Self {
            kit,
            player,
            active: None,
            display: String::new(),
            debouncer: Debouncer::new(debounce_window),
        }
    }

    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Label of the last pad that started playing.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_key(&self) -> Option<char> {
        self.active
            .and_then(|index| self.kit.get(index))
            .map(|pad| pad.trigger_key)
    }

    pub fn is_playing(&self, index: usize) -> bool {
        self.player.is_playing(index)
    }

    /// Fires the pad bound to `key` right away. Unknown keys are ignored.
    pub fn trigger(&mut self, key: char) {
        let Some(index) = self.kit.index_of(key) else {
            debug!(key = %key, "Ignoring unbound key");
            return;
        };

        if let Some(current) = self.active.take() {
            self.player.stop(current);
        }

        if !self.player.has_clip(index) {
            debug!(key = %key, "No clip for pad");
            return;
        }

        self.player.rewind(index);
        match self.player.play(index) {
            Ok(()) => {
                let pad: &PadDefinition = &self.kit.pads()[index];
                self.active = Some(index);
                self.display.clear();
                self.display.push_str(pad.label);
                info!(key = %key, label = pad.label, "Pad triggered");
            }
            Err(e) => {
                warn!(key = %key, err = %e, "Playback failed");
            }
        }
    }

    /// Debounced entry point shared by every input source.
    pub fn request_trigger(&mut self, key: char, now: Instant) {
        if !self.kit.contains(key) {
            debug!(key = %key, "Ignoring unbound key");
            return;
        }
        if self.debouncer.submit(key, now) {
            debug!(key = %key, "Superseded pending trigger");
        }
    }

    /// Fires the pending trigger if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<char> {
        let key = self.debouncer.poll(now)?;
        self.trigger(key);
        Some(key)
    }

    /// When the pending trigger is due, for scheduling the next poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Stop(usize),
        Rewind(usize),
        Play(usize),
    }

    /// Records calls and tracks play state per pad.
    #[derive(Default)]
    struct MockPlayer {
        missing: HashSet<usize>,
        rejecting: HashSet<usize>,
        playing: HashSet<usize>,
        positions: Vec<usize>,
        calls: Vec<Call>,
    }

    impl MockPlayer {
        fn new() -> Self {
            Self {
                positions: vec![0; 9],
                ..Default::default()
            }
        }

        fn plays(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Play(_)))
                .count()
        }

        /// Simulates audio time passing on a playing clip.
        fn advance(&mut self, index: usize, frames: usize) {
            if self.playing.contains(&index) {
                self.positions[index] += frames;
            }
        }
    }

    impl ClipPlayer for MockPlayer {
        fn has_clip(&mut self, index: usize) -> bool {
            !self.missing.contains(&index)
        }

        fn stop(&mut self, index: usize) {
            self.calls.push(Call::Stop(index));
            self.playing.remove(&index);
            self.positions[index] = 0;
        }

        fn rewind(&mut self, index: usize) {
            self.calls.push(Call::Rewind(index));
            self.positions[index] = 0;
        }

        fn play(&mut self, index: usize) -> Result<(), AudioError> {
            self.calls.push(Call::Play(index));
            if self.rejecting.contains(&index) {
                return Err(AudioError::NoOutputDevice);
            }
            self.playing.insert(index);
            Ok(())
        }

        fn is_playing(&self, index: usize) -> bool {
            self.playing.contains(&index)
        }
    }

    fn board() -> PadBoard<MockPlayer> {
        PadBoard::new(Kit::default(), MockPlayer::new(), debounce::DEFAULT_WINDOW)
    }

    #[test]
    fn test_every_pad_sets_label_and_single_flag() {
        let mut board = board();
        for pad in Kit::default().pads() {
            board.trigger(pad.trigger_key);
            assert_eq!(board.display(), pad.label);
            assert_eq!(board.active_key(), Some(pad.trigger_key));
            assert_eq!(board.player().playing.len(), 1);
        }
    }

    #[test]
    fn test_trigger_q() {
        let mut board = board();
        assert_eq!(board.display(), "");

        board.trigger('Q');
        assert_eq!(board.display(), "Heater 1");
        assert_eq!(board.active(), Some(0));
        assert!(board.is_playing(0));
        assert_eq!(board.player().calls, vec![Call::Rewind(0), Call::Play(0)]);
    }

    #[test]
    fn test_unbound_key_changes_nothing() {
        let mut board = board();
        board.trigger('W');
        let calls_before = board.player().calls.len();

        board.trigger('G');
        board.trigger('q');
        assert_eq!(board.display(), "Heater 2");
        assert_eq!(board.active_key(), Some('W'));
        assert_eq!(board.player().calls.len(), calls_before);
    }

    #[test]
    fn test_switching_pads_stops_previous() {
        let mut board = board();
        board.trigger('Q');
        board.player_mut().advance(0, 500);

        board.trigger('X');
        assert_eq!(board.active_key(), Some('X'));
        assert!(!board.is_playing(0));
        assert!(board.is_playing(7));
        assert_eq!(board.player().positions[0], 0);
        assert_eq!(
            board.player().calls[2..],
            [Call::Stop(0), Call::Rewind(7), Call::Play(7)]
        );
        assert_eq!(board.display(), "Kick");
    }

    #[test]
    fn test_same_key_restarts_from_zero() {
        let mut board = board();
        board.trigger('S');
        board.player_mut().advance(4, 1000);

        board.trigger('S');
        assert_eq!(board.player().positions[4], 0);
        assert_eq!(board.player().playing.len(), 1);
        assert!(board.is_playing(4));
    }

    #[test]
    fn test_missing_clip_is_ignored_after_stopping_current() {
        let mut board = board();
        board.player_mut().missing.insert(5);
        board.trigger('Q');

        board.trigger('D');
        assert_eq!(board.active(), None);
        assert_eq!(board.display(), "Heater 1");
        assert!(board.player().playing.is_empty());
        assert!(!board.player().calls.contains(&Call::Play(5)));
    }

    #[test]
    fn test_playback_rejection_is_swallowed() {
        let mut board = board();
        board.player_mut().rejecting.insert(2);
        board.trigger('A');

        board.trigger('E');
        assert_eq!(board.active(), None);
        assert_eq!(board.display(), "Heater 4");
        assert!(board.player().playing.is_empty());
    }

    #[test]
    fn test_keyboard_path_uppercases() {
        let mut listener = keyboard::KeyboardListener::new(Kit::default());
        listener.attach();
        let mut board = board();

        let key = listener.key_pressed("z").unwrap();
        board.trigger(key);
        assert_eq!(board.display(), "Kick-n'-Hat");
    }

    #[test]
    fn test_rapid_requests_play_once() {
        let start = Instant::now();
        let mut board = board();

        board.request_trigger('Q', start);
        board.request_trigger('Q', start + Duration::from_millis(40));
        assert_eq!(board.poll(start + Duration::from_millis(100)), None);
        assert_eq!(
            board.poll(start + Duration::from_millis(140)),
            Some('Q')
        );
        assert_eq!(board.poll(start + Duration::from_millis(400)), None);

        assert_eq!(board.player().plays(), 1);
        assert_eq!(board.display(), "Heater 1");
    }

    #[test]
    fn test_requests_outside_window_both_play() {
        let start = Instant::now();
        let mut board = board();

        board.request_trigger('W', start);
        board.poll(start + Duration::from_millis(100));
        board.request_trigger('C', start + Duration::from_millis(150));
        board.poll(start + Duration::from_millis(250));

        assert_eq!(board.player().plays(), 2);
        assert_eq!(board.active_key(), Some('C'));
        assert_eq!(board.next_deadline(), None);
    }

    #[test]
    fn test_unbound_request_keeps_pending_key() {
        let start = Instant::now();
        let mut board = board();

        board.request_trigger('E', start);
        board.request_trigger('G', start + Duration::from_millis(10));
        assert_eq!(board.poll(start + Duration::from_millis(100)), Some('E'));
    }
}
