use std::{collections::VecDeque, f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{AudioConfig, DirectorError, Result};

/// Converts a PCM stream into byte-scaled frequency bins.
///
/// Each call to [`SpectrumAnalyser::frequency_bins`] windows the most recent
/// `fft_size` samples, smooths the magnitudes against the previous call and
/// maps the decibel range `[min_decibels, max_decibels]` onto `0..=255`.
pub struct SpectrumAnalyser {
    config: AudioConfig,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    window: Vec<f32>,
    fft: FftResources,
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl SpectrumAnalyser {
    /// Fails with [`DirectorError::InvalidConfig`] when `config` does not
    /// describe a usable analyser.
    pub fn new(config: AudioConfig) -> Result<Self> {
        config.validate()?;
        let size = config.fft_size;
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        let fft = FftResources {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        };

        Ok(Self {
            history: VecDeque::with_capacity(size),
            smoothed: vec![0.0; config.bin_count()],
            window: (0..size).map(|index| blackman_value(index, size)).collect(),
            fft,
            config,
        })
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Appends samples to the analysis window. Only the newest `fft_size`
    /// samples are kept.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<()> {
        if samples.iter().any(|sample| !sample.is_finite()) {
            return Err(DirectorError::InvalidInput("audio samples must be finite"));
        }

        let size = self.config.fft_size;
        let skip = samples.len().saturating_sub(size);
        self.history.extend(&samples[skip..]);
        let overflow = self.history.len().saturating_sub(size);
        self.history.drain(..overflow);
        Ok(())
    }

    /// Clears the window and the smoothing state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.smoothed.fill(0.0);
    }

    pub fn frequency_bins(&mut self) -> Result<Vec<u8>> {
        let size = self.config.fft_size;
        let padding = size - self.history.len();
        let fft = &mut self.fft;

        fft.input[..padding].fill(0.0);
        for (offset, sample) in self.history.iter().enumerate() {
            let index = padding + offset;
            fft.input[index] = sample * self.window[index];
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let tau = self.config.smoothing;
        let scale = 1.0 / size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&fft.spectrum) {
            let magnitude = bin.norm() * scale;
            let value = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if value.is_finite() { value } else { 0.0 };
        }

        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        Ok(self
            .smoothed
            .iter()
            .map(|&magnitude| to_byte(magnitude, min_db, range))
            .collect())
    }
}

fn to_byte(magnitude: f32, min_db: f32, range: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    (255.0 * (db - min_db) / range).clamp(0.0, 255.0) as u8
}

fn blackman_value(index: usize, len: usize) -> f32 {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    let phase = 2.0 * PI * index as f32 / len as f32;
    a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("config", &self.config)
            .field("buffered", &self.history.len())
            .finish()
    }
}
