//! PADBOARD - a nine-pad drum machine library
//!
//! This library provides the core components for building a pad sampler:
//! - A fixed kit of key/label/sample pad definitions
//! - A pad board that keeps at most one clip sounding at a time
//! - Debounced triggering shared by mouse, keyboard and MIDI input
//! - Sample decoding and audio output
//! - MIDI input from pad controllers

pub mod audio;
pub mod board;
pub mod config;
pub mod midi;
pub mod pads;

// Re-export commonly used types
pub use crate::audio::{AudioError, AudioOutput};
pub use crate::board::debounce::Debouncer;
pub use crate::board::keyboard::KeyboardListener;
pub use crate::board::{ClipPlayer, PadBoard};
pub use crate::config::Settings;
pub use crate::midi::{midi_note_name, MidiInputDevice, NoteMap, PadEvent};
pub use crate::pads::{Kit, PadDefinition, DEFAULT_KIT};
