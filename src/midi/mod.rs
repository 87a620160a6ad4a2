//! MIDI pad input using midir
use midir::{MidiInput, MidiInputConnection};
use std::sync::mpsc::Sender;
use tracing::{debug, info, trace};

const CLIENT_NAME: &str = "PADBOARD MIDI Input";

#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("Failed to create MIDI input: {0}")]
    Init(#[from] midir::InitError),

    #[error("No MIDI input port named {0:?}")]
    PortNotFound(String),

    #[error("Failed to connect: {0}")]
    Connect(String),
}

/// A hit from a MIDI pad controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    Pressed(u8, u8), // note, velocity
}

/// Decodes a raw MIDI message. Note-on with zero velocity is a release and
/// yields nothing, as do all other message types.
pub fn parse_message(bytes: &[u8]) -> Option<PadEvent> {
    match bytes {
        [status, note, velocity, ..] if status & 0xF0 == 0x90 && *velocity > 0 => {
            Some(PadEvent::Pressed(note & 0x7F, velocity & 0x7F))
        }
        _ => None,
    }
}

/// Maps pads to consecutive MIDI notes starting at `base_note`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMap {
    base_note: u8,
    pads: usize,
}

impl NoteMap {
    pub fn new(base_note: u8, pads: usize) -> Self {
        Self { base_note, pads }
    }

    pub fn note_for(&self, index: usize) -> Option<u8> {
        if index >= self.pads {
            return None;
        }
        let note = self.base_note as usize + index;
        (note <= 127).then_some(note as u8)
    }

    pub fn index_for(&self, note: u8) -> Option<usize> {
        let index = note.checked_sub(self.base_note)? as usize;
        (index < self.pads).then_some(index)
    }
}

pub struct MidiInputDevice {
    connection: Option<MidiInputConnection<()>>,
}

impl MidiInputDevice {
    pub fn new() -> Self {
        Self { connection: None }
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_in) = MidiInput::new(CLIENT_NAME) {
            midi_in
                .ports()
                .iter()
                .filter_map(|p| midi_in.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    /// Listens on the named port, forwarding pad hits to `sender`. Replaces
    /// any existing connection.
    pub fn connect(&mut self, port_name: &str, sender: Sender<PadEvent>) -> Result<(), MidiError> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| midi_in.port_name(p).is_ok_and(|name| name == port_name))
            .ok_or_else(|| MidiError::PortNotFound(port_name.to_string()))?;

        let connection = midi_in
            .connect(
                port,
                "padboard",
                move |_, raw_event, _| {
                    trace!(bytes = ?raw_event, "Received MIDI message");
                    if let Some(event) = parse_message(raw_event) {
                        if sender.send(event).is_err() {
                            debug!("Pad event receiver dropped");
                        }
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!(port = port_name, "Listening for MIDI pad input");
        self.connection = Some(connection);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            debug!("MIDI input disconnected");
        }
    }
}

impl Default for MidiInputDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn midi_note_name(note: u8) -> String {
    let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    let note_index = (note % 12) as usize;
    format!("{}{}", note_names[note_index], octave)
}
