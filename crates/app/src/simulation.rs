use std::f32::consts::PI;

use reactive_backdrop_core::{
    DirectorEvent, MediaSource, PlayRequest, PlaybackSurface, ResourceReleaser,
};

/// Stand-in for a media element. Play requests resolve on the next frame and
/// videos report their natural end.
#[derive(Debug, Default)]
pub struct SimulatedPlayback {
    loaded: Option<MediaSource>,
    time: f64,
    playing: bool,
    pending: Vec<PlayRequest>,
}

impl SimulatedPlayback {
    /// Advances the clock by `seconds` and returns the notifications the
    /// media element would have fired meanwhile.
    pub fn advance(&mut self, seconds: f64) -> Vec<DirectorEvent> {
        let mut events: Vec<_> = self
            .pending
            .drain(..)
            .map(DirectorEvent::PlaybackStarted)
            .collect();
        if !events.is_empty() {
            self.playing = true;
        }

        if let (true, Some(duration)) = (self.playing, self.duration()) {
            self.time += seconds;
            if self.time >= duration {
                self.time = duration;
                self.playing = false;
                events.push(DirectorEvent::PlaybackEnded);
            }
        }
        events
    }
}

impl PlaybackSurface for SimulatedPlayback {
    fn load(&mut self, source: &MediaSource) {
        self.loaded = Some(source.clone());
        self.time = 0.0;
        self.playing = false;
    }

    fn play(&mut self, request: PlayRequest) {
        self.pending.push(request);
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        let source = self.loaded.as_ref().filter(|source| source.is_video())?;
        // Stable per-locator length between 6 and 15 seconds.
        let spread = source.locator.bytes().map(u32::from).sum::<u32>() % 10;
        Some(6.0 + spread as f64)
    }
}

#[derive(Debug, Default)]
pub struct LoggingReleaser {
    released: usize,
}

impl ResourceReleaser for LoggingReleaser {
    fn release(&mut self, locator: &str) {
        self.released += 1;
        tracing::info!(locator, total = self.released, "released transient media");
    }
}

/// Four-on-the-floor kick: a decaying burst of partials spread across the
/// bass and mid bins.
#[derive(Debug)]
pub struct KickSynth {
    sample_rate: f32,
    beat_samples: usize,
    position: usize,
}

const PARTIALS_HZ: [f32; 6] = [60.0, 190.0, 375.0, 560.0, 940.0, 1500.0];
const DECAY_SECONDS: f32 = 0.06;

impl KickSynth {
    pub fn new(sample_rate: u32, bpm: f32) -> Self {
        let bpm = if bpm > 0.0 { bpm } else { 120.0 };
        Self {
            sample_rate: sample_rate as f32,
            beat_samples: ((60.0 / bpm) * sample_rate as f32).max(1.0) as usize,
            position: 0,
        }
    }

    pub fn next_block(&mut self, len: usize) -> Vec<f32> {
        (0..len)
            .map(|_| {
                let t = (self.position % self.beat_samples) as f32 / self.sample_rate;
                self.position += 1;
                let envelope = (-t / DECAY_SECONDS).exp();
                let tone: f32 = PARTIALS_HZ
                    .iter()
                    .map(|frequency| (2.0 * PI * frequency * t).sin())
                    .sum();
                0.25 * envelope * tone
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactive_backdrop_core::{AudioConfig, FrequencyAnalyzer, SpectrumAnalyser};

    #[test]
    fn play_requests_resolve_on_the_next_frame() {
        let mut playback = SimulatedPlayback::default();
        playback.load(&MediaSource::video("clip.mp4"));
        let request = PlayRequest {
            id: 7,
            locator: "clip.mp4".into(),
        };
        playback.play(request.clone());

        let events = playback.advance(0.016);
        assert_eq!(events, vec![DirectorEvent::PlaybackStarted(request)]);
        assert!(playback.advance(0.016).is_empty());
        assert!(playback.current_time() > 0.0);
    }

    #[test]
    fn reports_end_of_media_once() {
        let mut playback = SimulatedPlayback::default();
        playback.load(&MediaSource::video("clip.mp4"));
        playback.play(PlayRequest {
            id: 1,
            locator: "clip.mp4".into(),
        });

        let events = playback.advance(60.0);
        assert!(events.contains(&DirectorEvent::PlaybackEnded));
        assert!(playback.advance(1.0).is_empty());
    }

    #[test]
    fn images_have_no_duration() {
        let mut playback = SimulatedPlayback::default();
        playback.load(&MediaSource::image("still.png"));
        assert!(playback.duration().is_none());
    }

    #[test]
    fn kick_onsets_read_as_strong_beats() {
        let config = AudioConfig::default();
        let mut synth = KickSynth::new(config.sample_rate, 120.0);
        let mut spectrum = SpectrumAnalyser::new(config).unwrap();
        let analyzer = FrequencyAnalyzer::default();

        let mut peak = 0.0f32;
        for _ in 0..10 {
            spectrum.push_samples(&synth.next_block(800)).unwrap();
            let bins = spectrum.frequency_bins().unwrap();
            peak = peak.max(analyzer.beat_strength(&bins));
        }
        assert!(peak > 0.5, "{peak}");
    }
}
