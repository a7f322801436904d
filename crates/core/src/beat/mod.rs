use serde::{Deserialize, Serialize};

use crate::BeatConfig;

/// Outcome of feeding one beat-strength sample to the detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatObservation {
    pub chromatic_strength: f32,
    pub advance: bool,
}

/// Edge-triggered, debounced comparator over the beat-strength stream.
///
/// The chromatic strength snaps to the beat strength on strong beats and
/// otherwise decays by a fixed factor once per observation, so the decay
/// rate follows the frame rate rather than wall-clock time.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatConfig,
    chromatic_strength: f32,
    last_advance_ms: Option<f64>,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(BeatConfig::default())
    }
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            config,
            chromatic_strength: 0.0,
            last_advance_ms: None,
        }
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    pub fn chromatic_strength(&self) -> f32 {
        self.chromatic_strength
    }

    /// Timestamp of the most recent advance event, if one has fired.
    pub fn last_advance_ms(&self) -> Option<f64> {
        self.last_advance_ms
    }

    pub fn reset(&mut self) {
        self.chromatic_strength = 0.0;
        self.last_advance_ms = None;
    }

    /// Updates the detector with the beat strength measured at `now_ms`.
    pub fn observe(&mut self, beat_strength: f32, now_ms: f64) -> BeatObservation {
        // NaN and negative readings count as silence.
        let beat_strength = beat_strength.max(0.0);

        if beat_strength > self.config.chromatic_threshold {
            self.chromatic_strength = beat_strength;
        } else {
            self.chromatic_strength *= self.config.decay;
        }

        let advance = beat_strength > self.config.beat_threshold && self.cooldown_elapsed(now_ms);
        if advance {
            tracing::trace!(beat_strength, now_ms, "beat advance");
            self.last_advance_ms = Some(now_ms);
        }

        BeatObservation {
            chromatic_strength: self.chromatic_strength,
            advance,
        }
    }

    fn cooldown_elapsed(&self, now_ms: f64) -> bool {
        self.last_advance_ms
            .map(|last| now_ms - last > self.config.min_beat_interval_ms)
            .unwrap_or(true)
    }
}
