use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::BandLayout;

/// Full scale of a single frequency bin as delivered by the audio source.
pub const BIN_FULL_SCALE: f32 = 255.0;

/// Band energies and the weighted beat strength derived from one spectrum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatAnalysis {
    pub bass_average: f32,
    pub mid_average: f32,
    pub beat_strength: f32,
}

/// Turns frequency bins into a single beat-strength scalar.
///
/// Bands outside the supplied spectrum are truncated to the bins that exist,
/// and a band with no bins contributes zero.
#[derive(Debug, Clone, Default)]
pub struct FrequencyAnalyzer {
    layout: BandLayout,
}

impl FrequencyAnalyzer {
    pub fn new(layout: BandLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn analyze(&self, bins: &[u8]) -> BeatAnalysis {
        let bass_average = band_average(bins, &self.layout.bass);
        let mid_average = band_average(bins, &self.layout.mid);
        BeatAnalysis {
            bass_average,
            mid_average,
            beat_strength: self.layout.bass_weight * bass_average
                + self.layout.mid_weight * mid_average,
        }
    }

    pub fn beat_strength(&self, bins: &[u8]) -> f32 {
        self.analyze(bins).beat_strength
    }
}

fn band_average(bins: &[u8], band: &Range<usize>) -> f32 {
    let end = band.end.min(bins.len());
    let start = band.start.min(end);
    let band = &bins[start..end];
    if band.is_empty() {
        return 0.0;
    }

    let sum: u32 = band.iter().map(|&bin| u32::from(bin)).sum();
    sum as f32 / (band.len() as f32 * BIN_FULL_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> FrequencyAnalyzer {
        FrequencyAnalyzer::new(BandLayout::default())
    }

    #[test]
    fn full_scale_bins_give_unit_strength() {
        let analysis = analyzer().analyze(&[255; 128]);

        assert!((analysis.bass_average - 1.0).abs() < 1e-6);
        assert!((analysis.mid_average - 1.0).abs() < 1e-6);
        assert!((analysis.beat_strength - 1.0).abs() < 1e-6);
    }

    #[test]
    fn weights_bass_over_mid() {
        let mut bins = vec![0u8; 128];
        bins[..4].fill(255);
        assert!((analyzer().beat_strength(&bins) - 0.7).abs() < 1e-6);

        let mut bins = vec![0u8; 128];
        bins[4..12].fill(255);
        assert!((analyzer().beat_strength(&bins) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn ignores_bins_above_mid_band() {
        let mut bins = vec![0u8; 128];
        bins[12..].fill(255);
        assert_eq!(analyzer().beat_strength(&bins), 0.0);
    }

    #[test]
    fn empty_input_is_silence() {
        assert_eq!(analyzer().analyze(&[]), BeatAnalysis::default());
    }

    #[test]
    fn truncates_short_spectra() {
        // Only two bass bins and no mid band at all.
        let analysis = analyzer().analyze(&[255, 255]);
        assert!((analysis.bass_average - 1.0).abs() < 1e-6);
        assert_eq!(analysis.mid_average, 0.0);

        // Mid band shortened to two bins.
        let analysis = analyzer().analyze(&[0, 0, 0, 0, 255, 0]);
        assert!((analysis.mid_average - 0.5).abs() < 1e-6);
    }

    #[test]
    fn strength_stays_in_unit_range() {
        let mut state = 0x2545_f491_u32;
        for _ in 0..500 {
            let bins: Vec<u8> = (0..128)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    (state & 0xff) as u8
                })
                .collect();
            let strength = analyzer().beat_strength(&bins);
            assert!((0.0..=1.0 + 1e-6).contains(&strength), "{strength}");
        }
    }
}
