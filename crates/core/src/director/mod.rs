//! Frame-driven coordinator for the audio-reactive background.
//!
//! Callbacks from the outside world (audio, media element, pointer,
//! keyboard, uploads) are queued as [`DirectorEvent`]s and drained once per
//! animation frame by [`MediaDirector::tick`]. Every media switch, whatever
//! triggered it, goes through the [`PlaybackContinuityManager`].

use serde::{Deserialize, Serialize};

use crate::{
    AudioLevels, BeatAnalysis, BeatDetector, Completion, ControlState, DirectorConfig,
    DirectorError, FrameUniforms, FrequencyAnalyzer, MediaPlaylist, MediaSource, PlayRequest,
    PlaybackContinuityManager, PlaybackSurface, RenderUniformPipeline, ResourceReleaser, Result,
    Slider, SwitchPhase, Viewport, VisualSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Where a manual advance came from. Keyboard commands are subject to the
/// live-capture lock, pointer gestures are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOrigin {
    Keyboard,
    Pointer,
}

/// Closed set of inputs consumed by [`MediaDirector::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    /// Fresh frequency bins. Only the last frame of a tick is analysed.
    AudioFrame(Vec<u8>),
    PlaybackStarted(PlayRequest),
    PlaybackFailed { request: PlayRequest, reason: String },
    PlaybackEnded,
    UserAdvance {
        direction: Direction,
        origin: CommandOrigin,
    },
    PlaylistReplaced(Vec<MediaSource>),
    /// Pointer position in viewport pixels.
    PointerMoved { x: f32, y: f32 },
    SliderSet { slider: Slider, percent: f32 },
    StylizationToggled,
    ViewportResized(Viewport),
    LiveCaptureChanged(bool),
}

/// Running counters, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorStats {
    pub frames: u64,
    pub beat_advances: u64,
    pub manual_advances: u64,
    pub ignored_commands: u64,
    pub replacements: u64,
    pub loops: u64,
    pub failed_starts: u64,
    pub stale_completions: u64,
}

pub struct MediaDirector<P, R> {
    analyzer: FrequencyAnalyzer,
    beat: BeatDetector,
    playlist: MediaPlaylist,
    continuity: PlaybackContinuityManager,
    controls: ControlState,
    uniforms: RenderUniformPipeline,
    playback: P,
    releaser: R,
    last_analysis: Option<BeatAnalysis>,
    started: bool,
    stats: DirectorStats,
}

impl<P: PlaybackSurface, R: ResourceReleaser> MediaDirector<P, R> {
    pub fn new(
        config: &DirectorConfig,
        viewport: Viewport,
        playback: P,
        releaser: R,
    ) -> Result<Self> {
        config.validate()?;
        let playlist = MediaPlaylist::new(config.playlist.sources.clone())
            .ok_or_else(|| DirectorError::config("playlist must contain at least one source"))?;

        Ok(Self {
            analyzer: FrequencyAnalyzer::new(config.bands.clone()),
            beat: BeatDetector::new(config.beat.clone()),
            playlist,
            continuity: PlaybackContinuityManager::new(),
            controls: ControlState::new(config.controls.clone(), viewport),
            uniforms: RenderUniformPipeline::new(),
            playback,
            releaser,
            last_analysis: None,
            started: false,
            stats: DirectorStats::default(),
        })
    }

    /// Loads the first playlist entry. Called implicitly by the first tick.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let index = self.playlist.current_index();
        self.switch_to_index(index);
    }

    /// Runs one animation frame.
    pub fn tick<I>(&mut self, now_ms: f64, events: I) -> FrameUniforms
    where
        I: IntoIterator<Item = DirectorEvent>,
    {
        self.start();

        let mut bins = None;
        for event in events {
            match event {
                DirectorEvent::AudioFrame(frame) => bins = Some(frame),
                other => self.handle(other, now_ms),
            }
        }

        let analysis = bins.map(|bins| self.analyzer.analyze(&bins));
        self.last_analysis = analysis;
        let levels = match analysis {
            Some(analysis) => {
                let observation = self.beat.observe(analysis.beat_strength, now_ms);
                if observation.advance {
                    self.stats.beat_advances += 1;
                    self.advance(Direction::Forward);
                }
                Some(AudioLevels {
                    beat_strength: analysis.beat_strength,
                    chromatic_strength: observation.chromatic_strength,
                })
            }
            None => None,
        };

        self.stats.frames += 1;
        self.uniforms.package(now_ms, &self.controls, levels)
    }

    /// Stops playback and releases every transient locator still referenced.
    pub fn shutdown(&mut self) {
        self.continuity.stop(&mut self.playback);
        self.playlist.release_all(&mut self.releaser);
        tracing::info!(stats = ?self.stats, "director shut down");
    }

    /// The media the renderer should currently sample. `None` while a switch
    /// is unresolved or abandoned, in which case the renderer keeps showing
    /// its previous frame.
    pub fn visual(&self) -> Option<VisualSource> {
        if self.continuity.phase() != SwitchPhase::Settled {
            return None;
        }
        let source = self.continuity.displayed()?;
        Some(VisualSource::new(source, self.playback.current_time()))
    }

    pub fn playlist(&self) -> &MediaPlaylist {
        &self.playlist
    }

    pub fn continuity(&self) -> &PlaybackContinuityManager {
        &self.continuity
    }

    pub fn beat_detector(&self) -> &BeatDetector {
        &self.beat
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    pub fn last_analysis(&self) -> Option<BeatAnalysis> {
        self.last_analysis
    }

    pub fn stats(&self) -> DirectorStats {
        self.stats
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    pub fn releaser(&self) -> &R {
        &self.releaser
    }

    fn handle(&mut self, event: DirectorEvent, now_ms: f64) {
        match event {
            DirectorEvent::AudioFrame(_) => {}
            DirectorEvent::PlaybackStarted(request) => {
                let completion = self.continuity.playback_started(&mut self.playback, &request);
                self.count_completion(completion);
            }
            DirectorEvent::PlaybackFailed { request, reason } => {
                let completion = self.continuity.playback_failed(&request, &reason);
                self.count_completion(completion);
            }
            DirectorEvent::PlaybackEnded => {
                if self.continuity.playback_ended(&mut self.playback) {
                    self.stats.loops += 1;
                }
            }
            DirectorEvent::UserAdvance { direction, origin } => {
                if origin == CommandOrigin::Keyboard && !self.controls.manual_controls_enabled() {
                    tracing::debug!(?direction, "keyboard advance ignored during live capture");
                    self.stats.ignored_commands += 1;
                    return;
                }
                self.stats.manual_advances += 1;
                self.advance(direction);
            }
            DirectorEvent::PlaylistReplaced(sources) => self.replace_playlist(sources),
            DirectorEvent::PointerMoved { x, y } => self.controls.pointer_moved(x, y, now_ms),
            DirectorEvent::SliderSet { slider, percent } => {
                if !self.controls.set_slider(slider, percent) {
                    self.stats.ignored_commands += 1;
                }
            }
            DirectorEvent::StylizationToggled => {
                let stylized = self.controls.toggle_stylization();
                tracing::debug!(stylized, "stylization toggled");
            }
            DirectorEvent::ViewportResized(viewport) => self.controls.resize(viewport),
            DirectorEvent::LiveCaptureChanged(active) => self.controls.set_live_capture(active),
        }
    }

    fn count_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Settled { .. } => {}
            Completion::Abandoned => self.stats.failed_starts += 1,
            Completion::Stale => self.stats.stale_completions += 1,
        }
    }

    fn advance(&mut self, direction: Direction) {
        let index = match direction {
            Direction::Forward => self.playlist.next(),
            Direction::Backward => self.playlist.previous(),
        };
        self.switch_to_index(index);
    }

    fn replace_playlist(&mut self, sources: Vec<MediaSource>) {
        if !self.playlist.replace(sources, &mut self.releaser) {
            return;
        }
        self.stats.replacements += 1;
        let index = self.playlist.current_index();
        self.switch_to_index(index);
        self.continuity.prune(self.playlist.sources());
    }

    fn switch_to_index(&mut self, index: usize) {
        let source = self.playlist.commit(index).clone();
        self.continuity.switch_to(&mut self.playback, &source);
    }
}

impl<P, R> std::fmt::Debug for MediaDirector<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDirector")
            .field("playlist", &self.playlist)
            .field("continuity", &self.continuity)
            .field("chromatic_strength", &self.beat.chromatic_strength())
            .field("stats", &self.stats)
            .finish()
    }
}
