use std::path::PathBuf;

/// Error types for sample loading and playback
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Sample not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio file error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Sample unavailable: {0}")]
    Unavailable(String),

    #[error("No pad at index {0}")]
    NoSuchPad(usize),
}
