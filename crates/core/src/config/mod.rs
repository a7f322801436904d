use std::{ops::Range, path::Path};

use serde::{Deserialize, Serialize};

use crate::{DirectorError, MediaKind, MediaSource, Result};

/// Top-level configuration structure for the director.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub beat: BeatConfig,
    pub bands: BandLayout,
    pub audio: AudioConfig,
    pub controls: ControlConfig,
    pub playlist: PlaylistConfig,
}

impl DirectorConfig {
    /// Parses and validates a JSON document. Missing fields take their
    /// defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.beat.validate()?;
        self.bands.validate()?;
        self.audio.validate()?;
        self.controls.validate()?;
        if self.playlist.sources.is_empty() {
            return Err(DirectorError::config("playlist must contain at least one source"));
        }
        Ok(())
    }
}

/// Thresholds and timing of the beat detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Beat strength above which the chromatic effect snaps to the beat.
    pub chromatic_threshold: f32,
    /// Beat strength above which an advance event may fire.
    pub beat_threshold: f32,
    /// Refractory period between two advance events, in milliseconds.
    pub min_beat_interval_ms: f64,
    /// Per-tick multiplier applied to the chromatic strength between beats.
    pub decay: f32,
}

pub const CHROMATIC_THRESHOLD: f32 = 0.80;
pub const BEAT_THRESHOLD: f32 = 0.80;
pub const MIN_BEAT_INTERVAL_MS: f64 = 100.0;
pub const CHROMATIC_DECAY: f32 = 0.9;

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            chromatic_threshold: CHROMATIC_THRESHOLD,
            beat_threshold: BEAT_THRESHOLD,
            min_beat_interval_ms: MIN_BEAT_INTERVAL_MS,
            decay: CHROMATIC_DECAY,
        }
    }
}

impl BeatConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("chromatic_threshold", self.chromatic_threshold),
            ("beat_threshold", self.beat_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(DirectorError::config(format!(
                    "{name} must lie in (0, 1], got {value}"
                )));
            }
        }
        if !(self.min_beat_interval_ms >= 0.0) {
            return Err(DirectorError::config("min_beat_interval_ms must not be negative"));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(DirectorError::config(format!(
                "decay must lie in [0, 1), got {}",
                self.decay
            )));
        }
        Ok(())
    }
}

/// Frequency-bin partition used to derive the beat strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandLayout {
    pub bass: Range<usize>,
    pub mid: Range<usize>,
    pub bass_weight: f32,
    pub mid_weight: f32,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self {
            bass: 0..4,
            mid: 4..12,
            bass_weight: 0.7,
            mid_weight: 0.3,
        }
    }
}

impl BandLayout {
    fn validate(&self) -> Result<()> {
        if self.bass.start > self.bass.end || self.mid.start > self.mid.end {
            return Err(DirectorError::config("band ranges must not be reversed"));
        }
        let weights = [self.bass_weight, self.mid_weight];
        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(DirectorError::config("band weights must be finite and non-negative"));
        }
        if self.bass_weight + self.mid_weight > 1.0 + f32::EPSILON {
            return Err(DirectorError::config("band weights must not sum above 1"));
        }
        Ok(())
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    /// Time constant of the exponential smoothing between spectra.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AudioConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DirectorError::config("sample_rate must be positive"));
        }
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(DirectorError::config(format!(
                "fft_size must be a power of two of at least 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(DirectorError::config("smoothing must lie in [0, 1)"));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(DirectorError::config("min_decibels must be below max_decibels"));
        }
        Ok(())
    }
}

/// Manual control behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Ignore keyboard advances and slider clicks while live capture runs.
    pub lock_manual_controls_during_capture: bool,
    /// Pointer speed, in pixels per second, that maps to a velocity of 1.
    pub velocity_scale: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            lock_manual_controls_during_capture: true,
            velocity_scale: 1000.0,
        }
    }
}

impl ControlConfig {
    fn validate(&self) -> Result<()> {
        if !(self.velocity_scale > 0.0) {
            return Err(DirectorError::config("velocity_scale must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub sources: Vec<MediaSource>,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        let sources = [
            "vid/C0008.MP4_Rendered_001.mp4",
            "vid/C0016.MP4_Rendered_001.mp4",
            "vid/C0014.MP4_Rendered_001.mp4",
            "vid/C0022.MP4_Rendered_001.mp4",
        ]
        .into_iter()
        .map(|locator| MediaSource::new(locator, MediaKind::Video))
        .collect();
        Self { sources }
    }
}
