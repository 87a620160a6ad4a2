//! Sample loading and caching for pad clips.
//!
//! Clips are decoded entirely into memory, converted to the output stream's
//! channel count and sample rate, and cached by resolved path.

use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info};

use super::fetch::{HttpFetcher, SampleFetcher};
use super::AudioError;
use crate::pads::file_name_of;

/// A decoded clip, interleaved at the loader's target format.
#[derive(Clone, Debug)]
pub struct LoadedSample {
    data: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl LoadedSample {
    pub fn data(&self) -> &Arc<Vec<f32>> {
        &self.data
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Resolves pad sources to files and decodes them on demand. Remote sources
/// missing from the samples directory are downloaded into it first.
pub struct SampleLoader {
    samples_dir: PathBuf,
    target_sample_rate: u32,
    target_channels: u16,
    cache: HashMap<PathBuf, LoadedSample>,
    fetcher: Box<dyn SampleFetcher>,
}

impl SampleLoader {
    pub fn new(samples_dir: impl Into<PathBuf>, target_sample_rate: u32, target_channels: u16) -> Self {
        Self {
            samples_dir: samples_dir.into(),
            target_sample_rate,
            target_channels: target_channels.max(1),
            cache: HashMap::new(),
            fetcher: Box::new(HttpFetcher::default()),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn SampleFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn set_fetcher(&mut self, fetcher: Box<dyn SampleFetcher>) {
        self.fetcher = fetcher;
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    pub fn resolve(&self, source: &str) -> PathBuf {
        resolve_source(&self.samples_dir, source)
    }

    /// Loads a clip, returning the cached copy if it was decoded before.
    pub fn load(&mut self, source: &str) -> Result<LoadedSample, AudioError> {
        let path = self.resolve(source);

        if let Some(sample) = self.cache.get(&path) {
            debug!(path = ?path, "Using cached sample");
            return Ok(sample.clone());
        }

        if !path.is_file() {
            if !is_remote(source) || file_name_of(source).is_empty() {
                return Err(AudioError::NotFound(path));
            }
            self.fetcher.fetch(source, &path)?;
        }

        let (samples, channels, sample_rate) = decode_file(&path)?;
        let samples = remix_channels(&samples, channels, self.target_channels);
        let samples = if sample_rate != self.target_sample_rate {
            debug!(
                source_rate = sample_rate,
                target_rate = self.target_sample_rate,
                "Transcoding sample"
            );
            resample_linear(
                &samples,
                self.target_channels,
                sample_rate,
                self.target_sample_rate,
            )
        } else {
            samples
        };

        let loaded = LoadedSample {
            data: Arc::new(samples),
            channels: self.target_channels,
            sample_rate: self.target_sample_rate,
        };

        info!(
            path = ?path,
            source_channels = channels,
            source_rate = sample_rate,
            duration_ms = loaded.duration().as_millis(),
            "Sample loaded"
        );

        self.cache.insert(path, loaded.clone());
        Ok(loaded)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("samples_dir", &self.samples_dir)
            .field("target_sample_rate", &self.target_sample_rate)
            .field("target_channels", &self.target_channels)
            .field("cached_samples", &self.cache.len())
            .finish()
    }
}

/// Maps a pad source to a local file. Remote URLs are looked up by file
/// name inside the samples directory; relative paths are joined onto it.
pub fn resolve_source(samples_dir: &Path, source: &str) -> PathBuf {
    if is_remote(source) {
        return samples_dir.join(file_name_of(source));
    }

    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        samples_dir.join(path)
    }
}

fn is_remote(source: &str) -> bool {
    source.contains("://")
}

/// Decodes a whole file to interleaved f32. Returns (samples, channels, rate).
fn decode_file(path: &Path) -> Result<(Vec<f32>, u16, u32), AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;
    let mut sample_rate = params.sample_rate;
    let mut channels = params.channels.map(|c| c.count() as u16);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(path = ?path, reason, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    match (channels, sample_rate) {
        (Some(channels), Some(sample_rate)) if channels > 0 && sample_rate > 0 => {
            Ok((samples, channels, sample_rate))
        }
        _ => Err(AudioError::NoAudioTrack),
    }
}

/// Converts interleaved audio between channel counts. Downmixing to mono
/// averages; otherwise output channel `c` takes source channel `c % from`.
fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }

    let from = from as usize;
    let to = to as usize;
    let frames = samples.len() / from;
    let mut output = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if to == 1 {
            output.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            output.extend((0..to).map(|c| frame[c % from]));
        }
    }

    output
}

/// Linear-interpolation resampler; plenty for one-shot drum hits.
fn resample_linear(samples: &[f32], channels: u16, source_rate: u32, target_rate: u32) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channels as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let s0 = samples
                .get(source_frame * channels + channel)
                .copied()
                .unwrap_or(0.0);
            let s1 = samples
                .get((source_frame + 1) * channels + channel)
                .copied()
                .unwrap_or(s0);
            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}
