//! Audio output using cpal
//!
//! Every pad owns one voice slot. The output callback mixes whichever voices
//! are playing; the board guarantees that is at most one.
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod error;
pub mod fetch;
pub mod loader;

pub use error::AudioError;
pub use fetch::{HttpFetcher, SampleFetcher};
pub use loader::{LoadedSample, SampleLoader};

use crate::board::ClipPlayer;
use crate::pads::Kit;

const FALLBACK_SAMPLE_RATE: u32 = 44100;
const FALLBACK_CHANNELS: u16 = 2;

/// A single pad's playback state.
#[derive(Default)]
struct Voice {
    data: Option<Arc<Vec<f32>>>,
    position: usize,
    playing: bool,
}

impl Voice {
    fn mix_into(&mut self, out: &mut [f32], gain: f32) {
        if !self.playing {
            return;
        }
        let Some(data) = self.data.as_ref() else {
            self.playing = false;
            return;
        };

        let remaining = data.get(self.position..).unwrap_or(&[]);
        let count = remaining.len().min(out.len());
        for (sample, source) in out.iter_mut().zip(&remaining[..count]) {
            *sample += source * gain;
        }

        self.position += count;
        if self.position >= data.len() {
            self.playing = false;
        }
    }
}

/// Voice slots plus master gain, shared with the output callback.
struct Mixer {
    voices: Vec<Voice>,
    volume: f32,
}

impl Mixer {
    fn new(slots: usize, volume: f32) -> Self {
        Self {
            voices: (0..slots).map(|_| Voice::default()).collect(),
            volume: volume.clamp(0.0, 1.0),
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let gain = self.volume;
        for voice in self.voices.iter_mut() {
            voice.mix_into(out, gain);
        }
        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

#[derive(Debug, Clone)]
enum LoadState {
    Unloaded,
    Loaded,
    Missing(PathBuf),
    Failed(String),
}

/// Pad sample player backed by the default output device.
pub struct AudioOutput {
    stream: Option<cpal::Stream>,
    mixer: Arc<Mutex<Mixer>>,
    loader: SampleLoader,
    sources: Vec<&'static str>,
    states: Vec<LoadState>,
}

impl AudioOutput {
    /// Opens the default output device for the given kit.
    pub fn new(kit: &Kit, samples_dir: impl Into<PathBuf>, volume: f32) -> Result<Self, AudioError> {
        let mixer = Arc::new(Mutex::new(Mixer::new(kit.len(), volume)));
        let (stream, sample_rate, channels) = Self::setup_audio_stream(Arc::clone(&mixer))?;

        info!(sample_rate, channels, pads = kit.len(), "Audio output ready");

        Ok(Self {
            stream: Some(stream),
            mixer,
            loader: SampleLoader::new(samples_dir, sample_rate, channels),
            sources: kit.pads().iter().map(|pad| pad.audio_source).collect(),
            states: vec![LoadState::Unloaded; kit.len()],
        })
    }

    /// A player with no output stream. Clips still load, but playback is
    /// always rejected with [`AudioError::NoOutputDevice`].
    pub fn silent(kit: &Kit, samples_dir: impl Into<PathBuf>, volume: f32) -> Self {
        Self {
            stream: None,
            mixer: Arc::new(Mutex::new(Mixer::new(kit.len(), volume))),
            loader: SampleLoader::new(samples_dir, FALLBACK_SAMPLE_RATE, FALLBACK_CHANNELS),
            sources: kit.pads().iter().map(|pad| pad.audio_source).collect(),
            states: vec![LoadState::Unloaded; kit.len()],
        }
    }

    /// Opens the default device, falling back to a silent player.
    pub fn open_or_silent(kit: &Kit, samples_dir: impl Into<PathBuf>, volume: f32) -> Self {
        let samples_dir = samples_dir.into();
        Self::new(kit, samples_dir.clone(), volume).unwrap_or_else(|e| {
            warn!(err = %e, "Audio output unavailable, pads will be silent");
            Self::silent(kit, samples_dir, volume)
        })
    }

    fn setup_audio_stream(mixer: Arc<Mutex<Mixer>>) -> Result<(cpal::Stream, u32, u16), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        mixer.lock().render(data);
                    },
                    |err| error!(err = %err, "Audio stream error"),
                    None,
                )
                .map_err(|e| AudioError::Stream(e.to_string()))?,
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        };

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        Ok((stream, sample_rate, channels))
    }

    pub fn has_output(&self) -> bool {
        self.stream.is_some()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.mixer.lock().volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.mixer.lock().volume
    }

    pub fn loader(&self) -> &SampleLoader {
        &self.loader
    }

    /// Replaces how remote pad samples are downloaded.
    pub fn set_fetcher(&mut self, fetcher: Box<dyn SampleFetcher>) {
        self.loader.set_fetcher(fetcher);
    }

    /// Decodes a pad's clip on first use. Failures are remembered so a broken
    /// file is only reported once.
    fn ensure_loaded(&mut self, index: usize) -> Result<(), AudioError> {
        let state = self
            .states
            .get(index)
            .cloned()
            .ok_or(AudioError::NoSuchPad(index))?;

        match state {
            LoadState::Loaded => Ok(()),
            LoadState::Missing(path) => Err(AudioError::NotFound(path)),
            LoadState::Failed(reason) => Err(AudioError::Unavailable(reason)),
            LoadState::Unloaded => {
                let source = self.sources[index];
                match self.loader.load(source) {
                    Ok(sample) => {
                        let mut mixer = self.mixer.lock();
                        mixer.voices[index].data = Some(Arc::clone(sample.data()));
                        self.states[index] = LoadState::Loaded;
                        Ok(())
                    }
                    Err(AudioError::NotFound(path)) => {
                        warn!(pad = index, path = ?path, "Sample file missing");
                        self.states[index] = LoadState::Missing(path.clone());
                        Err(AudioError::NotFound(path))
                    }
                    Err(e) => {
                        warn!(pad = index, source, err = %e, "Failed to load sample");
                        self.states[index] = LoadState::Failed(e.to_string());
                        Err(e)
                    }
                }
            }
        }
    }
}

impl ClipPlayer for AudioOutput {
    fn has_clip(&mut self, index: usize) -> bool {
        !matches!(
            self.ensure_loaded(index),
            Err(AudioError::NotFound(_)) | Err(AudioError::NoSuchPad(_))
        )
    }

    fn stop(&mut self, index: usize) {
        if let Some(voice) = self.mixer.lock().voices.get_mut(index) {
            voice.playing = false;
            voice.position = 0;
        }
    }

    fn rewind(&mut self, index: usize) {
        if let Some(voice) = self.mixer.lock().voices.get_mut(index) {
            voice.position = 0;
        }
    }

    fn play(&mut self, index: usize) -> Result<(), AudioError> {
        self.ensure_loaded(index)?;
        if !self.has_output() {
            return Err(AudioError::NoOutputDevice);
        }

        let mut mixer = self.mixer.lock();
        let voice = mixer
            .voices
            .get_mut(index)
            .ok_or(AudioError::NoSuchPad(index))?;
        voice.playing = true;
        debug!(pad = index, "Voice started");
        Ok(())
    }

    fn is_playing(&self, index: usize) -> bool {
        self.mixer
            .lock()
            .voices
            .get(index)
            .is_some_and(|voice| voice.playing)
    }
}

/// Names of the host's output devices.
pub fn list_output_devices() -> Result<Vec<String>, AudioError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}
