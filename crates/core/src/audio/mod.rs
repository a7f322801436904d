use std::sync::{Arc, Mutex, MutexGuard};

use crate::{AudioConfig, DirectorError, Result, SpectrumAnalyser};

/// Anything that can hand the director a spectrum on demand.
pub trait AudioSource {
    /// Returns byte-scaled frequency bins, or `None` when no audio is
    /// connected.
    fn frequency_bins(&mut self) -> Option<Vec<u8>>;
}

/// Where the analysed audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioInput {
    /// Soundtrack of the media currently playing. Always available and used
    /// as the fallback.
    MediaElement,
    /// Live system audio granted by the user.
    Capture,
}

/// Handle for one outstanding capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Pending(CaptureTicket),
    Active,
}

#[derive(Debug)]
struct Routing {
    input: AudioInput,
    capture: CaptureState,
    next_ticket: u64,
}

/// Shared audio front end. Capture callbacks push PCM from their own thread
/// while the frame tick pulls spectra.
#[derive(Debug, Clone)]
pub struct AudioEngine {
    spectrum: Arc<Mutex<SpectrumAnalyser>>,
    routing: Arc<Mutex<Routing>>,
}

impl AudioEngine {
    pub fn new(config: AudioConfig) -> Result<Self> {
        Ok(Self {
            spectrum: Arc::new(Mutex::new(SpectrumAnalyser::new(config)?)),
            routing: Arc::new(Mutex::new(Routing {
                input: AudioInput::MediaElement,
                capture: CaptureState::Idle,
                next_ticket: 0,
            })),
        })
    }

    pub fn active_input(&self) -> Result<AudioInput> {
        Ok(self.lock_routing()?.input)
    }

    pub fn capture_state(&self) -> Result<CaptureState> {
        Ok(self.lock_routing()?.capture)
    }

    pub fn is_capturing(&self) -> Result<bool> {
        Ok(self.lock_routing()?.capture == CaptureState::Active)
    }

    /// Feeds samples from `input`. Samples from the inactive input are
    /// dropped so a pending or denied capture never disturbs the fallback.
    pub fn push_samples(&self, input: AudioInput, samples: &[f32]) -> Result<()> {
        if samples.is_empty() || self.lock_routing()?.input != input {
            return Ok(());
        }
        self.lock_spectrum()?.push_samples(samples)
    }

    pub fn spectrum(&self) -> Result<Vec<u8>> {
        self.lock_spectrum()?.frequency_bins()
    }

    /// Starts acquiring live capture. The caller resolves the returned ticket
    /// once the user grants or denies access; earlier tickets go stale.
    pub fn request_capture(&self) -> Result<CaptureTicket> {
        let mut routing = self.lock_routing()?;
        routing.next_ticket += 1;
        let ticket = CaptureTicket(routing.next_ticket);
        if routing.capture != CaptureState::Active {
            routing.capture = CaptureState::Pending(ticket);
        }
        tracing::info!(ticket = ticket.0, "requested live audio capture");
        Ok(ticket)
    }

    /// Returns `false` if the ticket is no longer the pending request.
    pub fn capture_granted(&self, ticket: CaptureTicket) -> Result<bool> {
        {
            let mut routing = self.lock_routing()?;
            if routing.capture != CaptureState::Pending(ticket) {
                tracing::debug!(ticket = ticket.0, "ignoring stale capture grant");
                return Ok(false);
            }
            routing.capture = CaptureState::Active;
            routing.input = AudioInput::Capture;
        }
        self.lock_spectrum()?.reset();
        tracing::info!("live audio capture active");
        Ok(true)
    }

    /// Falls back to the media element's soundtrack.
    pub fn capture_denied(&self, ticket: CaptureTicket, reason: &str) -> Result<bool> {
        let mut routing = self.lock_routing()?;
        if routing.capture != CaptureState::Pending(ticket) {
            return Ok(false);
        }
        routing.capture = CaptureState::Idle;
        routing.input = AudioInput::MediaElement;
        tracing::warn!(reason, "live audio capture unavailable, using media soundtrack");
        Ok(true)
    }

    pub fn stop_capture(&self) -> Result<()> {
        {
            let mut routing = self.lock_routing()?;
            if routing.capture == CaptureState::Idle {
                return Ok(());
            }
            routing.capture = CaptureState::Idle;
            routing.input = AudioInput::MediaElement;
        }
        self.lock_spectrum()?.reset();
        tracing::info!("live audio capture stopped");
        Ok(())
    }

    fn lock_spectrum(&self) -> Result<MutexGuard<'_, SpectrumAnalyser>> {
        self.spectrum
            .lock()
            .map_err(|_| DirectorError::msg("spectrum analyser has been poisoned"))
    }

    fn lock_routing(&self) -> Result<MutexGuard<'_, Routing>> {
        self.routing
            .lock()
            .map_err(|_| DirectorError::msg("audio routing has been poisoned"))
    }
}

impl AudioSource for AudioEngine {
    fn frequency_bins(&mut self) -> Option<Vec<u8>> {
        match self.spectrum() {
            Ok(bins) => Some(bins),
            Err(err) => {
                tracing::error!(%err, "audio spectrum unavailable");
                None
            }
        }
    }
}

/// Source that never yields audio, for running without any input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl AudioSource for Silence {
    fn frequency_bins(&mut self) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud_block() -> Vec<f32> {
        (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 375.0 * i as f32 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn media_element_is_the_default_input() {
        let mut audio = AudioEngine::new(AudioConfig::default()).unwrap();
        assert_eq!(audio.active_input().unwrap(), AudioInput::MediaElement);

        audio.push_samples(AudioInput::MediaElement, &loud_block()).unwrap();
        let bins = audio.frequency_bins().expect("engine always yields bins");
        assert!(bins[2] > 0);
    }

    #[test]
    fn drops_samples_from_the_inactive_input() {
        let audio = AudioEngine::new(AudioConfig::default()).unwrap();
        audio.push_samples(AudioInput::Capture, &loud_block()).unwrap();
        assert!(audio.spectrum().unwrap().iter().all(|&bin| bin == 0));
    }

    #[test]
    fn granted_capture_switches_input() {
        let audio = AudioEngine::new(AudioConfig::default()).unwrap();
        let ticket = audio.request_capture().unwrap();
        assert_eq!(audio.capture_state().unwrap(), CaptureState::Pending(ticket));

        assert!(audio.capture_granted(ticket).unwrap());
        assert!(audio.is_capturing().unwrap());
        assert_eq!(audio.active_input().unwrap(), AudioInput::Capture);

        audio.stop_capture().unwrap();
        assert_eq!(audio.active_input().unwrap(), AudioInput::MediaElement);
        assert_eq!(audio.capture_state().unwrap(), CaptureState::Idle);
    }

    #[test]
    fn denied_capture_falls_back() {
        let audio = AudioEngine::new(AudioConfig::default()).unwrap();
        let ticket = audio.request_capture().unwrap();

        assert!(audio.capture_denied(ticket, "permission denied").unwrap());
        assert_eq!(audio.active_input().unwrap(), AudioInput::MediaElement);
        assert!(!audio.capture_granted(ticket).unwrap());
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let audio = AudioEngine::new(AudioConfig::default()).unwrap();
        let first = audio.request_capture().unwrap();
        let second = audio.request_capture().unwrap();

        assert!(!audio.capture_granted(first).unwrap());
        assert!(audio.capture_granted(second).unwrap());
    }

    #[test]
    fn clones_share_state_across_threads() {
        let audio = AudioEngine::new(AudioConfig::default()).unwrap();
        let producer = audio.clone();
        let block = loud_block();
        std::thread::spawn(move || producer.push_samples(AudioInput::MediaElement, &block))
            .join()
            .unwrap()
            .unwrap();

        assert!(audio.spectrum().unwrap()[2] > 0);
    }

    #[test]
    fn refuses_a_zero_length_window() {
        let config = AudioConfig {
            fft_size: 0,
            ..AudioConfig::default()
        };
        let err = AudioEngine::new(config).unwrap_err();
        assert!(matches!(err, DirectorError::InvalidConfig(_)));
    }

    #[test]
    fn silence_yields_nothing() {
        assert!(Silence.frequency_bins().is_none());
    }
}
