//! Runtime settings, layered from defaults, an optional YAML file and the environment
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

mod error;

pub use error::ConfigError;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "padboard.yaml";

/// Prefix for environment overrides, e.g. `PADBOARD_DEBOUNCE_MS=50`.
pub const ENV_PREFIX: &str = "PADBOARD";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory the kit's sample files are read from.
    samples_dir: PathBuf,

    /// Minimum spacing between triggers, in milliseconds.
    debounce_ms: u64,

    /// Master volume, 0.0 to 1.0.
    volume: f32,

    /// Name of a MIDI input port to take pad hits from.
    midi_input: Option<String>,

    /// MIDI note of the first pad; the rest follow chromatically.
    midi_base_note: u8,

    window_width: f32,
    window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("samples"),
            debounce_ms: 100,
            volume: 0.8,
            midi_input: None,
            midi_base_note: 36,
            window_width: 420.0,
            window_height: 480.0,
        }
    }
}

impl Settings {
    /// Loads settings from a file and the environment. An explicit `path`
    /// must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let required = path.is_some();
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::from_builder(
            Config::builder()
                .add_source(File::from(path).required(required))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Settings, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings.normalized())
    }

    fn normalized(mut self) -> Self {
        self.volume = self.volume.clamp(0.0, 1.0);
        self.midi_base_note = self.midi_base_note.min(127);
        self
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    pub fn set_samples_dir(&mut self, samples_dir: PathBuf) {
        self.samples_dir = samples_dir;
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn midi_input(&self) -> Option<&str> {
        self.midi_input.as_deref()
    }

    pub fn midi_base_note(&self) -> u8 {
        self.midi_base_note
    }

    pub fn window_size(&self) -> [f32; 2] {
        [self.window_width, self.window_height]
    }
}
