use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{MediaKind, MediaSource};

/// One-shot play request handed to the playback surface. The surface answers
/// later with a started or failed notification carrying the same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayRequest {
    pub id: u64,
    pub locator: String,
}

/// The single media element the director plays backgrounds through.
///
/// `play` completes asynchronously: the owner of the surface reports the
/// outcome back with the request it was given.
pub trait PlaybackSurface {
    fn load(&mut self, source: &MediaSource);
    fn play(&mut self, request: PlayRequest);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// `None` while the duration is unknown.
    fn duration(&self) -> Option<f64>;
}

/// Relative playback progress per locator. Missing entries read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionCache {
    fractions: HashMap<String, f64>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locator: &str) -> f64 {
        self.fractions.get(locator).copied().unwrap_or(0.0)
    }

    pub fn record(&mut self, locator: &str, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.fractions.insert(locator.to_string(), fraction);
    }

    pub fn reset(&mut self, locator: &str) {
        self.record(locator, 0.0);
    }

    /// Drops entries for locators not in `sources`.
    pub fn retain_sources(&mut self, sources: &[MediaSource]) {
        self.fractions
            .retain(|locator, _| sources.iter().any(|source| &source.locator == locator));
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}

/// Converts an absolute time into a fraction of the duration, treating an
/// unknown or degenerate duration as the start of the media.
pub fn relative_position(current_time: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 && current_time.is_finite() => {
            (current_time / duration).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Progress of the most recent switch. Video switches go
/// `Loading -> Starting -> Seeking -> Settled`; images settle immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchPhase {
    #[default]
    Idle,
    Loading,
    Starting,
    Seeking,
    Settled,
    /// Playback could not start; the previous frame stays on screen.
    Abandoned,
}

/// What became of a play completion handed to the manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    Settled { seek_to: f64 },
    Abandoned,
    /// The completion targets a switch that has since been superseded.
    Stale,
}

#[derive(Debug, Clone)]
struct PendingSwitch {
    request: PlayRequest,
    target: MediaSource,
}

/// Sequences every media switch through one protocol so that relative
/// playback position carries across sources of different length.
///
/// This is the only component that touches the playback surface.
#[derive(Debug, Default)]
pub struct PlaybackContinuityManager {
    positions: PositionCache,
    displayed: Option<MediaSource>,
    pending: Option<PendingSwitch>,
    phase: SwitchPhase,
    next_request_id: u64,
}

impl PlaybackContinuityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &PositionCache {
        &self.positions
    }

    pub fn phase(&self) -> SwitchPhase {
        self.phase
    }

    /// The source whose frames are on screen: the last switch that settled.
    pub fn displayed(&self) -> Option<&MediaSource> {
        self.displayed.as_ref()
    }

    /// Request that has not yet been confirmed or rejected, if any.
    pub fn pending_request(&self) -> Option<&PlayRequest> {
        self.pending.as_ref().map(|pending| &pending.request)
    }

    /// Switches the surface to `incoming`, recording where the outgoing video
    /// was. An incoming video inherits that fraction; without one it resumes
    /// from its own cached position. Any switch still waiting on playback is
    /// superseded.
    pub fn switch_to(&mut self, surface: &mut dyn PlaybackSurface, incoming: &MediaSource) {
        if let Some(fraction) = self.record_outgoing(surface) {
            if incoming.is_video() {
                self.positions.record(&incoming.locator, fraction);
            }
        }
        if let Some(superseded) = self.pending.take() {
            tracing::debug!(
                request = superseded.request.id,
                locator = %superseded.target,
                "superseding pending switch"
            );
        }

        tracing::info!(locator = %incoming, kind = ?incoming.kind, "switching media");
        surface.pause();
        self.phase = SwitchPhase::Loading;
        surface.load(incoming);

        match incoming.kind {
            MediaKind::Video => self.begin_playback(surface, incoming.clone()),
            MediaKind::Image => {
                self.phase = SwitchPhase::Settled;
                self.displayed = Some(incoming.clone());
            }
        }
    }

    /// Handles confirmation that playback started. The stored relative
    /// position is applied only now, after the surface is playing.
    pub fn playback_started(
        &mut self,
        surface: &mut dyn PlaybackSurface,
        request: &PlayRequest,
    ) -> Completion {
        let Some(pending) = self.take_pending(request) else {
            tracing::debug!(
                request = request.id,
                locator = %request.locator,
                "discarding stale play completion"
            );
            return Completion::Stale;
        };

        self.phase = SwitchPhase::Seeking;
        let fraction = self.positions.get(&pending.target.locator);
        let duration = surface
            .duration()
            .filter(|duration| duration.is_finite() && *duration > 0.0)
            .unwrap_or(0.0);
        let seek_to = fraction * duration;
        surface.set_current_time(seek_to);

        tracing::debug!(locator = %pending.target, fraction, seek_to, "playback settled");
        self.phase = SwitchPhase::Settled;
        self.displayed = Some(pending.target);
        Completion::Settled { seek_to }
    }

    /// Handles a rejected play request. The switch is abandoned and whatever
    /// was displayed before stays displayed.
    pub fn playback_failed(&mut self, request: &PlayRequest, reason: &str) -> Completion {
        let Some(pending) = self.take_pending(request) else {
            tracing::debug!(request = request.id, "discarding stale play failure");
            return Completion::Stale;
        };

        tracing::warn!(locator = %pending.target, reason, "playback failed to start");
        self.phase = SwitchPhase::Abandoned;
        Completion::Abandoned
    }

    /// Natural end of the displayed video: forget its position and loop it
    /// from the start. Returns `false` when the notification does not apply.
    pub fn playback_ended(&mut self, surface: &mut dyn PlaybackSurface) -> bool {
        if self.phase != SwitchPhase::Settled {
            return false;
        }
        let Some(source) = self.displayed.clone().filter(MediaSource::is_video) else {
            return false;
        };

        tracing::debug!(locator = %source, "restarting video at end of media");
        self.positions.reset(&source.locator);
        surface.set_current_time(0.0);
        self.begin_playback(surface, source);
        true
    }

    /// Pauses the surface and drops any switch still waiting on playback.
    /// Completions arriving afterwards are reported as stale.
    pub fn stop(&mut self, surface: &mut dyn PlaybackSurface) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(request = pending.request.id, "dropping pending switch on stop");
        }
        surface.pause();
        self.phase = SwitchPhase::Idle;
    }

    /// Forgets positions of sources that left the playlist.
    pub fn prune(&mut self, sources: &[MediaSource]) {
        self.positions.retain_sources(sources);
    }

    fn record_outgoing(&mut self, surface: &dyn PlaybackSurface) -> Option<f64> {
        // Unless the last switch settled, the surface holds a source that
        // never started playing and has no meaningful position.
        if self.phase != SwitchPhase::Settled {
            return None;
        }
        let outgoing = self.displayed.as_ref().filter(|source| source.is_video())?;
        let fraction = relative_position(surface.current_time(), surface.duration());
        tracing::trace!(locator = %outgoing, fraction, "recording relative position");
        self.positions.record(&outgoing.locator, fraction);
        Some(fraction)
    }

    fn begin_playback(&mut self, surface: &mut dyn PlaybackSurface, target: MediaSource) {
        self.next_request_id += 1;
        let request = PlayRequest {
            id: self.next_request_id,
            locator: target.locator.clone(),
        };
        self.phase = SwitchPhase::Starting;
        self.pending = Some(PendingSwitch {
            request: request.clone(),
            target,
        });
        surface.play(request);
    }

    fn take_pending(&mut self, request: &PlayRequest) -> Option<PendingSwitch> {
        let matches = self
            .pending
            .as_ref()
            .map(|pending| pending.request == *request)
            .unwrap_or(false);
        if matches {
            self.pending.take()
        } else {
            None
        }
    }
}
